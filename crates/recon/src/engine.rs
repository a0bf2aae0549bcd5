use std::collections::BTreeSet;

use crate::aggregate::aggregate_indexes;
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::extract::extract;
use crate::key::index_records;
use crate::matcher::{compare_values, Comparison, Value};
use crate::model::{
    AggregatedEntry, Extraction, Labels, Mismatch, MissingKeys, ReconInput, ReconMeta, ReconResult, Record,
    SourceIndex, Warning, WarningKind,
};

/// Extract every source, then reconcile. The first source is the baseline.
pub fn run(config: &ReconConfig, input: &ReconInput) -> Result<ReconResult, ReconError> {
    check_sources(input.sources.iter().map(|s| s.name.as_str()))?;

    let extractions = input
        .sources
        .iter()
        .map(|s| extract(&s.name, &s.grid, &config.layout))
        .collect::<Result<Vec<_>, _>>()?;

    reconcile(config, &extractions)
}

/// Reconcile already-extracted sources.
pub fn reconcile(config: &ReconConfig, extractions: &[Extraction]) -> Result<ReconResult, ReconError> {
    check_sources(extractions.iter().map(|e| e.source.as_str()))?;

    let indexes: Vec<SourceIndex> = extractions
        .iter()
        .map(|e| index_records(&e.source, &e.records, config.duplicates.policy))
        .collect();

    let entries = aggregate_indexes(&indexes);
    let missing = missing_pairs(&indexes);
    let (mismatches, comparisons) = compare_entries(&entries, &indexes, config);

    let duplicates: Vec<_> = indexes.iter().flat_map(|i| i.duplicates.iter().cloned()).collect();

    let mut warnings: Vec<Warning> = extractions.iter().flat_map(|e| e.warnings.iter().cloned()).collect();
    warnings.extend(duplicates.iter().map(|d| Warning {
        kind: WarningKind::DuplicateKey,
        source: d.source.clone(),
        row: Some(d.discarded.row),
        col: Some(d.discarded.col),
        message: format!(
            "duplicate key at {} ({}); canonical value at {} ({})",
            d.discarded.cell, d.discarded_value, d.kept.cell, d.kept_value
        ),
    }));

    let summary = compute_summary(extractions, &indexes, &entries, &mismatches, comparisons, &warnings);
    log::info!(
        "{} key(s): {} matched, {} mismatched, {} duplicate(s)",
        summary.total_keys,
        summary.matched,
        summary.mismatches,
        summary.duplicates
    );

    Ok(ReconResult {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            baseline: extractions[0].source.clone(),
            sources: extractions.iter().map(|e| e.source.clone()).collect(),
            tolerance: config.tolerance,
            duplicate_policy: config.duplicates.policy,
        },
        summary,
        mismatches,
        missing,
        duplicates,
        warnings,
        entries,
    })
}

fn check_sources<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), ReconError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ReconError::DuplicateSource(name.to_string()));
        }
    }
    if seen.len() < 2 {
        return Err(ReconError::NotEnoughSources { found: seen.len() });
    }
    Ok(())
}

/// `keys(A) - keys(B)` for every ordered pair of sources.
pub fn missing_pairs(indexes: &[SourceIndex]) -> Vec<MissingKeys> {
    let mut out = Vec::new();
    for a in indexes {
        for b in indexes {
            if a.source == b.source {
                continue;
            }
            out.push(MissingKeys {
                present_in: a.source.clone(),
                absent_from: b.source.clone(),
                keys: a
                    .entries
                    .keys()
                    .filter(|k| !b.entries.contains_key(*k))
                    .cloned()
                    .collect(),
            });
        }
    }
    out
}

/// Compare every key held by two or more sources against its reference:
/// the baseline, or the first source holding the key when the baseline lacks it.
fn compare_entries(
    entries: &[AggregatedEntry],
    indexes: &[SourceIndex],
    config: &ReconConfig,
) -> (Vec<Mismatch>, usize) {
    let mut mismatches = Vec::new();
    let mut comparisons = 0;

    for entry in entries {
        let holders: Vec<&Record> = indexes.iter().filter_map(|i| i.entries.get(&entry.key)).collect();
        let Some((reference, others)) = holders.split_first() else {
            continue;
        };
        for other in others {
            comparisons += 1;
            let cmp = compare_values(value_of(reference), value_of(other), &config.tolerance);
            if let Comparison::Mismatch { kind, delta, major } = cmp {
                log::debug!("mismatch {}: {} vs {}", entry.key, reference.value_text, other.value_text);
                mismatches.push(Mismatch {
                    key: entry.key.clone(),
                    labels: Labels::of(reference),
                    kind,
                    reference: reference.provenance(),
                    other: other.provenance(),
                    v1: reference.value_text.clone(),
                    v2: other.value_text.clone(),
                    delta,
                    major,
                });
            }
        }
    }

    (mismatches, comparisons)
}

fn value_of(record: &Record) -> Value<'_> {
    Value {
        num: record.value_num,
        text: &record.value_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use crate::model::{Delta, MismatchKind, SourceInput};

    fn report(channel: &str, value: &str) -> Grid {
        Grid::from_strs(&[
            &["Financial", ""],
            &["", "Rx"],
            &["", "Base"],
            &["Channel", "2027"],
            &[channel, value],
        ])
        .unwrap()
    }

    fn input(grids: Vec<(&str, Grid)>) -> ReconInput {
        ReconInput {
            sources: grids
                .into_iter()
                .map(|(name, grid)| SourceInput {
                    name: name.into(),
                    grid,
                })
                .collect(),
        }
    }

    #[test]
    fn requires_two_sources() {
        let err = run(&ReconConfig::default(), &input(vec![("a", report("Retail", "1"))])).unwrap_err();
        assert!(matches!(err, ReconError::NotEnoughSources { found: 1 }));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = run(
            &ReconConfig::default(),
            &input(vec![("a", report("Retail", "1")), ("a", report("Retail", "1"))]),
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::DuplicateSource(ref n) if n == "a"));
    }

    #[test]
    fn numeric_mismatch_against_baseline() {
        let result = run(
            &ReconConfig::default(),
            &input(vec![("a", report("Retail", "$1,200.00")), ("b", report("Retail", "1198.00"))]),
        )
        .unwrap();
        assert_eq!(result.mismatches.len(), 1);
        let m = &result.mismatches[0];
        assert_eq!(m.kind, MismatchKind::Numeric);
        assert_eq!(m.delta, Some(Delta::Value(2.0)));
        assert_eq!(m.reference.source, "a");
        assert_eq!(m.other.cell, "B5");
        assert_eq!(m.v1, "$1,200.00");
        assert!(result.has_differences());
        assert_eq!(result.meta.baseline, "a");
    }

    #[test]
    fn missing_pairs_cover_both_directions() {
        let result = run(
            &ReconConfig::default(),
            &input(vec![("a", report("Mail", "1")), ("b", report("Retail", "1"))]),
        )
        .unwrap();
        assert_eq!(result.missing.len(), 2);
        assert_eq!(result.missing[0].present_in, "a");
        assert_eq!(result.missing[0].keys[0].channel, "mail");
        assert_eq!(result.missing[1].present_in, "b");
        assert_eq!(result.missing[1].keys[0].channel, "retail");
        assert_eq!(result.summary.comparisons, 0);
        assert!(result.mismatches.is_empty());
    }

    #[test]
    fn reference_falls_back_when_baseline_lacks_key() {
        let result = run(
            &ReconConfig::default(),
            &input(vec![
                ("a", report("Mail", "1")),
                ("b", report("Retail", "5")),
                ("c", report("Retail", "7")),
            ]),
        )
        .unwrap();
        assert_eq!(result.mismatches.len(), 1);
        assert_eq!(result.mismatches[0].reference.source, "b");
        assert_eq!(result.mismatches[0].other.source, "c");
        assert_eq!(result.missing.len(), 6);
    }
}
