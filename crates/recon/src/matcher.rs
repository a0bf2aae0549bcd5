use crate::config::{TolerancePolicy, ToleranceConfig};
use crate::model::{Delta, MismatchKind};
use crate::normalize::labels_equal;

/// Outcome of comparing one value against its reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison {
    Match,
    Mismatch {
        kind: MismatchKind,
        delta: Option<Delta>,
        major: bool,
    },
}

/// One side of a comparison: the parsed number (if any) and the raw text.
#[derive(Debug, Clone, Copy)]
pub struct Value<'a> {
    pub num: Option<f64>,
    pub text: &'a str,
}

/// Truncate toward zero at two decimals. The nudge keeps values such as
/// `1.23` (stored as `1.2299999…`) from losing a cent.
pub fn truncate_2(x: f64) -> f64 {
    (x * 100.0 + x.signum() * 1e-7).trunc() / 100.0
}

/// Epsilon-inclusive tolerance check: `|a - b| == t` always matches.
pub fn within_tolerance(a: f64, b: f64, tolerance: &ToleranceConfig) -> bool {
    let (a, b) = match tolerance.policy {
        TolerancePolicy::Truncate => (truncate_2(a), truncate_2(b)),
        _ => (a, b),
    };
    let delta = (a - b).abs();
    let limit = match tolerance.policy {
        TolerancePolicy::Absolute => tolerance.threshold,
        TolerancePolicy::Relative => tolerance.threshold * a.abs().max(b.abs()),
        TolerancePolicy::Truncate => 0.0,
    };
    let scale = 1.0_f64.max(a.abs()).max(b.abs()).max(delta).max(limit);
    let eps = f64::EPSILON * 16.0 * scale;
    delta <= limit + eps
}

/// Compare `other` against `reference`.
///
/// Numbers go through the tolerance policy. A numeric-looking cell that did
/// not parse never matches a number and carries a `NaN` delta. When neither
/// side parsed, the texts are compared after normalization.
pub fn compare_values(reference: Value<'_>, other: Value<'_>, tolerance: &ToleranceConfig) -> Comparison {
    match (reference.num, other.num) {
        (Some(a), Some(b)) => {
            if within_tolerance(a, b, tolerance) {
                Comparison::Match
            } else {
                Comparison::Mismatch {
                    kind: MismatchKind::Numeric,
                    delta: Some(Delta::Value((a - b).abs())),
                    major: a.trunc() != b.trunc(),
                }
            }
        }
        (Some(_), None) | (None, Some(_)) => Comparison::Mismatch {
            kind: MismatchKind::Numeric,
            delta: Some(Delta::NotANumber),
            major: true,
        },
        (None, None) => {
            if labels_equal(reference.text, other.text) {
                Comparison::Match
            } else {
                Comparison::Mismatch {
                    kind: MismatchKind::Text,
                    delta: None,
                    major: false,
                }
            }
        }
    }
}
