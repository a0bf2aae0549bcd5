//! Pure cell classifiers: blank / numeric / date-window / text.
//!
//! Extraction never inspects raw strings directly; every "does this look like
//! a number" or "is this a period label" decision goes through here.

use once_cell::sync::Lazy;
use regex::Regex;

static DATE_WINDOW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{2})/(\d{2})\s*[-\u{2013}\u{2014}]\s*(\d{2})/(\d{2})\b").expect("valid regex")
});

const CURRENCY_SYMBOLS: [char; 5] = ['$', '\u{20ac}', '\u{a3}', '\u{a5}', '\u{20b9}'];

/// Tagged classification of a single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Blank,
    Numeric(f64),
    /// A period label: a `MM/YY-MM/YY` window or a four-digit year.
    DateWindow(String),
    Text(String),
}

impl CellValue {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Numeric(_))
    }
}

/// Classify one cell. With `date_windows` off, years read as numbers and
/// windows read as text.
pub fn classify_cell(raw: &str, date_windows: bool) -> CellValue {
    let s = raw.trim();
    if s.is_empty() {
        return CellValue::Blank;
    }
    if date_windows {
        if let Some(token) = date_token(s) {
            return CellValue::DateWindow(token);
        }
    }
    match parse_numeric(s) {
        Some(n) => CellValue::Numeric(n),
        None => CellValue::Text(s.to_string()),
    }
}

pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub fn has_alpha(s: &str) -> bool {
    s.chars().any(|c| c.is_alphabetic())
}

/// Parse a financial number string:
/// - Strip currency symbols, commas, whitespace
/// - Handle `(123.45)` → `-123.45`
/// - A trailing `%` divides by 100
/// - Returns None if non-numeric characters remain after stripping
pub fn parse_numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Check for parenthesized negatives: (123.45) → -123.45
    let (is_negative, inner) = if trimmed.starts_with('(') && trimmed.ends_with(')') && trimmed.len() > 1 {
        (true, &trimmed[1..trimmed.len() - 1])
    } else {
        (false, trimmed)
    };

    let inner = inner.trim();
    let (is_percent, inner) = match inner.strip_suffix('%') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };

    let cleaned: String = inner
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    // After stripping, only digits, '.', and a leading sign may remain
    for (i, c) in cleaned.chars().enumerate() {
        match c {
            '0'..='9' | '.' => {}
            '-' | '+' if i == 0 && !is_negative => {}
            _ => return None,
        }
    }

    let mut value: f64 = cleaned.parse().ok()?;
    if is_percent {
        value /= 100.0;
    }
    Some(if is_negative { -value } else { value })
}

pub fn looks_numeric(s: &str) -> bool {
    parse_numeric(s).is_some()
}

/// Currency/percent-punctuated text made only of number-ish characters, e.g.
/// `$1,2.50` or `12.5.%`. Such cells are kept as values even when they fail to
/// parse, so a broken export surfaces as a mismatch instead of vanishing.
pub fn looks_numeric_shaped(s: &str) -> bool {
    let t = s.trim();
    if !t.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    let punctuated = t
        .chars()
        .any(|c| CURRENCY_SYMBOLS.contains(&c) || matches!(c, '%' | ',' | '(' | ')'));
    punctuated
        && t.chars().all(|c| {
            c.is_ascii_digit()
                || CURRENCY_SYMBOLS.contains(&c)
                || c.is_whitespace()
                || matches!(c, '%' | ',' | '.' | '(' | ')' | '-' | '+')
        })
}

/// A cell that produces a record: parseable, or numeric-shaped but broken.
pub fn is_value_cell(s: &str) -> bool {
    looks_numeric(s) || looks_numeric_shaped(s)
}

/// First `MM/YY-MM/YY` window in the text, normalized without spaces.
pub fn date_window_token(s: &str) -> Option<String> {
    DATE_WINDOW_RE
        .captures(s)
        .map(|c| format!("{}/{}-{}/{}", &c[1], &c[2], &c[3], &c[4]))
}

/// A cell that is exactly a four-digit year.
pub fn is_year_token(s: &str) -> bool {
    let t = s.trim();
    t.len() == 4
        && t.chars().all(|c| c.is_ascii_digit())
        && t.parse::<u16>().map(|y| (1900..2200).contains(&y)).unwrap_or(false)
}

/// Window or year token, if the cell carries one.
pub fn date_token(s: &str) -> Option<String> {
    if let Some(window) = date_window_token(s) {
        return Some(window);
    }
    if is_year_token(s) {
        return Some(s.trim().to_string());
    }
    None
}
