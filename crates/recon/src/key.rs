//! Composite keys and per-source indexing.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::config::DuplicatePolicy;
use crate::model::{CompositeKey, DuplicateKey, Record, SourceIndex};
use crate::normalize::normalize_label;

pub fn build_key(record: &Record) -> CompositeKey {
    CompositeKey {
        section: normalize_label(&record.section),
        group_path: record.group_path.iter().map(|g| normalize_label(g)).collect(),
        channel: normalize_label(&record.channel),
        metric: normalize_label(&record.metric),
        period: normalize_label(&record.period),
    }
}

/// Index one source's records by key. Records are visited in row-major order;
/// every extra same-key occurrence is flagged once, and `policy` decides which
/// occurrence stays canonical.
pub fn index_records(source: &str, records: &[Record], policy: DuplicatePolicy) -> SourceIndex {
    let mut ordered: Vec<&Record> = records.iter().collect();
    ordered.sort_by_key(|r| (r.row, r.col));

    let mut entries: BTreeMap<CompositeKey, Record> = BTreeMap::new();
    let mut duplicates = Vec::new();

    for record in ordered {
        let key = build_key(record);
        match entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
            }
            Entry::Occupied(mut slot) => {
                let (kept, discarded) = match policy {
                    DuplicatePolicy::KeepFirst => (slot.get().clone(), record.clone()),
                    DuplicatePolicy::KeepLast => (record.clone(), slot.insert(record.clone())),
                };
                log::debug!(
                    "{source}: duplicate key {} at {} (kept {})",
                    slot.key(),
                    discarded.cell,
                    kept.cell
                );
                duplicates.push(DuplicateKey {
                    source: source.to_string(),
                    key: slot.key().clone(),
                    kept: kept.provenance(),
                    kept_value: kept.value_text,
                    discarded: discarded.provenance(),
                    discarded_value: discarded.value_text,
                });
            }
        }
    }

    SourceIndex {
        source: source.to_string(),
        entries,
        duplicates,
    }
}
