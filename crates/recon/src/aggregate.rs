use std::collections::BTreeMap;

use crate::model::{AggregatedEntry, CompositeKey, Labels, SourceIndex, SourceValue};

/// Merge per-source indexes into one entry per key, values in source order.
/// Sources lacking a key get a placeholder slot (`present = false`).
pub fn aggregate_indexes(indexes: &[SourceIndex]) -> Vec<AggregatedEntry> {
    let mut groups: BTreeMap<&CompositeKey, Labels> = BTreeMap::new();
    for index in indexes {
        for (key, record) in &index.entries {
            groups.entry(key).or_insert_with(|| Labels::of(record));
        }
    }

    groups
        .into_iter()
        .map(|(key, labels)| AggregatedEntry {
            key: key.clone(),
            labels,
            values: indexes
                .iter()
                .map(|index| match index.entries.get(key) {
                    Some(record) => SourceValue {
                        source: index.source.clone(),
                        present: true,
                        value_num: record.value_num,
                        value_text: record.value_text.clone(),
                        cell: Some(record.cell.clone()),
                    },
                    None => SourceValue {
                        source: index.source.clone(),
                        present: false,
                        value_num: None,
                        value_text: String::new(),
                        cell: None,
                    },
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;
    use crate::key::index_records;
    use crate::model::Record;

    fn record(source: &str, channel: &str, value: &str) -> Record {
        Record {
            source: source.into(),
            section: "Financial".into(),
            group_path: vec!["Rx".into()],
            channel: channel.into(),
            metric: "Base".into(),
            period: "2027".into(),
            value_text: value.into(),
            value_num: value.parse().ok(),
            row: 4,
            col: 1,
            cell: "B5".into(),
        }
    }

    #[test]
    fn placeholders_for_missing_sources() {
        let a = index_records("a", &[record("a", "Retail", "1"), record("a", "Mail", "2")], DuplicatePolicy::KeepFirst);
        let b = index_records("b", &[record("b", "Retail", "1.5")], DuplicatePolicy::KeepFirst);
        let entries = aggregate_indexes(&[a, b]);
        assert_eq!(entries.len(), 2);

        // BTreeMap ordering: mail before retail
        let mail = &entries[0];
        assert_eq!(mail.labels.channel, "Mail");
        assert_eq!(mail.present_count(), 1);
        assert!(mail.values[0].present);
        assert!(!mail.values[1].present);
        assert_eq!(mail.values[1].source, "b");
        assert_eq!(mail.values[1].cell, None);

        let retail = &entries[1];
        assert_eq!(retail.present_count(), 2);
        assert_eq!(retail.values[1].value_num, Some(1.5));
    }

    #[test]
    fn labels_come_from_first_source_holding_key() {
        let a = index_records("a", &[], DuplicatePolicy::KeepFirst);
        let b = index_records("b", &[record("b", "RETAIL", "1")], DuplicatePolicy::KeepFirst);
        let c = index_records("c", &[record("c", "retail", "1")], DuplicatePolicy::KeepFirst);
        let entries = aggregate_indexes(&[a, b, c]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].labels.channel, "RETAIL");
        assert_eq!(entries[0].values.len(), 3);
    }
}
