use std::collections::BTreeMap;

use crate::model::{
    AggregatedEntry, Extraction, Mismatch, MismatchKind, ReconSummary, SourceIndex, SourceSummary, Warning,
};

/// Compute summary statistics from a finished comparison.
pub fn compute_summary(
    extractions: &[Extraction],
    indexes: &[SourceIndex],
    entries: &[AggregatedEntry],
    mismatches: &[Mismatch],
    comparisons: usize,
    warnings: &[Warning],
) -> ReconSummary {
    let mut warning_counts: BTreeMap<String, usize> = BTreeMap::new();
    for w in warnings {
        *warning_counts.entry(w.kind.to_string()).or_insert(0) += 1;
    }

    let mut numeric_mismatches = 0;
    let mut text_mismatches = 0;
    let mut major_mismatches = 0;
    for m in mismatches {
        match m.kind {
            MismatchKind::Numeric => numeric_mismatches += 1,
            MismatchKind::Text => text_mismatches += 1,
        }
        if m.major {
            major_mismatches += 1;
        }
    }

    let total_keys = entries.len();
    let sources = extractions
        .iter()
        .zip(indexes)
        .map(|(extraction, index)| SourceSummary {
            name: index.source.clone(),
            records: extraction.records.len(),
            keys: index.entries.len(),
            missing: total_keys - index.entries.len(),
            duplicates: index.duplicates.len(),
            warnings: warnings.iter().filter(|w| w.source == index.source).count(),
        })
        .collect();

    ReconSummary {
        total_keys,
        shared_keys: entries.iter().filter(|e| e.present_count() >= 2).count(),
        comparisons,
        matched: comparisons - mismatches.len(),
        mismatches: mismatches.len(),
        numeric_mismatches,
        text_mismatches,
        major_mismatches,
        duplicates: indexes.iter().map(|i| i.duplicates.len()).sum(),
        warning_counts,
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompositeKey, Labels, LayoutInfo, Provenance, Record, SourceValue, WarningKind};

    fn key(channel: &str) -> CompositeKey {
        CompositeKey {
            section: "financial".into(),
            group_path: vec![],
            channel: channel.into(),
            metric: "base".into(),
            period: "2027".into(),
        }
    }

    fn entry(channel: &str, present: &[bool]) -> AggregatedEntry {
        AggregatedEntry {
            key: key(channel),
            labels: Labels {
                section: "Financial".into(),
                group_path: vec![],
                channel: channel.into(),
                metric: "Base".into(),
                period: "2027".into(),
            },
            values: present
                .iter()
                .enumerate()
                .map(|(i, &p)| SourceValue {
                    source: format!("s{i}"),
                    present: p,
                    value_num: None,
                    value_text: String::new(),
                    cell: None,
                })
                .collect(),
        }
    }

    fn mismatch(kind: MismatchKind, major: bool) -> Mismatch {
        Mismatch {
            key: key("retail"),
            labels: entry("retail", &[]).labels,
            kind,
            reference: Provenance::new("s0", 4, 1),
            other: Provenance::new("s1", 4, 1),
            v1: "1".into(),
            v2: "2".into(),
            delta: None,
            major,
        }
    }

    fn extraction(source: &str) -> Extraction {
        Extraction {
            source: source.into(),
            layout: LayoutInfo::default(),
            records: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn index(source: &str, keys: &[&str]) -> SourceIndex {
        SourceIndex {
            source: source.into(),
            entries: keys
                .iter()
                .map(|k| {
                    (
                        key(k),
                        Record {
                            source: source.into(),
                            section: "Financial".into(),
                            group_path: vec![],
                            channel: (*k).into(),
                            metric: "Base".into(),
                            period: "2027".into(),
                            value_text: "1".into(),
                            value_num: Some(1.0),
                            row: 4,
                            col: 1,
                            cell: "B5".into(),
                        },
                    )
                })
                .collect(),
            duplicates: Vec::new(),
        }
    }

    #[test]
    fn summary_counts() {
        let entries = vec![entry("mail", &[true, false]), entry("retail", &[true, true])];
        let indexes = vec![index("s0", &["mail", "retail"]), index("s1", &["retail"])];
        let extractions = vec![extraction("s0"), extraction("s1")];
        let mismatches = vec![mismatch(MismatchKind::Numeric, true)];
        let warnings = vec![Warning {
            kind: WarningKind::CellParse,
            source: "s1".into(),
            row: Some(4),
            col: Some(1),
            message: "bad".into(),
        }];

        let summary = compute_summary(&extractions, &indexes, &entries, &mismatches, 1, &warnings);
        assert_eq!(summary.total_keys, 2);
        assert_eq!(summary.shared_keys, 1);
        assert_eq!(summary.matched, 0);
        assert_eq!(summary.mismatches, 1);
        assert_eq!(summary.numeric_mismatches, 1);
        assert_eq!(summary.text_mismatches, 0);
        assert_eq!(summary.major_mismatches, 1);
        assert_eq!(summary.warning_counts.get("cell_parse"), Some(&1));
        assert_eq!(summary.sources[0].missing, 0);
        assert_eq!(summary.sources[1].missing, 1);
        assert_eq!(summary.sources[1].warnings, 1);
    }
}
