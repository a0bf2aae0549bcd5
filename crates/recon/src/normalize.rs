/// Normalize a label for key comparison: trim, collapse internal whitespace,
/// unify en/em dashes to `-`, case-fold. Idempotent.
pub fn normalize_label(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(['\u{2013}', '\u{2014}'], "-")
        .to_lowercase()
}

/// Normalized text equality, used for non-numeric value comparison.
pub fn labels_equal(a: &str, b: &str) -> bool {
    normalize_label(a) == normalize_label(b)
}
