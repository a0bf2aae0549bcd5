use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub tolerance: ToleranceConfig,
    #[serde(default)]
    pub duplicates: DuplicateConfig,
    /// Optional: sources may also be given on the command line.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_name() -> String {
    "gridrecon".into()
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            layout: LayoutConfig::default(),
            tolerance: ToleranceConfig::default(),
            duplicates: DuplicateConfig::default(),
            sources: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Header rows are addressed by logical role, never per file name.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayoutConfig {
    /// Row carrying section labels. `None` → first non-blank header row.
    #[serde(default)]
    pub section_row: Option<usize>,
    /// Number of header rows (the data-start row). `None` → auto-detect.
    #[serde(default)]
    pub header_rows: Option<usize>,
    /// Consecutive blank header columns that end a section run.
    #[serde(default = "default_min_blank_sep")]
    pub min_blank_sep: usize,
    /// Treat `MM/YY-MM/YY` windows and four-digit years as period labels.
    #[serde(default = "default_true")]
    pub date_windows: bool,
    /// Data columns outside any section become "Standalone" blocks.
    #[serde(default = "default_true")]
    pub standalone: bool,
    #[serde(default = "default_max_header_scan")]
    pub max_header_scan: usize,
}

fn default_min_blank_sep() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_max_header_scan() -> usize {
    12
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            section_row: None,
            header_rows: None,
            min_blank_sep: default_min_blank_sep(),
            date_windows: true,
            standalone: true,
            max_header_scan: default_max_header_scan(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tolerance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TolerancePolicy {
    /// `|v1 - v2| <= threshold`
    Absolute,
    /// `|v1 - v2| <= threshold * max(|v1|, |v2|)`
    Relative,
    /// Both values truncated to two decimals, then compared exactly.
    Truncate,
}

impl Default for TolerancePolicy {
    fn default() -> Self {
        Self::Absolute
    }
}

impl std::fmt::Display for TolerancePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absolute => write!(f, "absolute"),
            Self::Relative => write!(f, "relative"),
            Self::Truncate => write!(f, "truncate"),
        }
    }
}

impl std::str::FromStr for TolerancePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absolute" => Ok(Self::Absolute),
            "relative" => Ok(Self::Relative),
            "truncate" => Ok(Self::Truncate),
            other => Err(format!(
                "unknown tolerance policy '{other}' (expected absolute, relative or truncate)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ToleranceConfig {
    #[serde(default)]
    pub policy: TolerancePolicy,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    0.01
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            policy: TolerancePolicy::Absolute,
            threshold: default_threshold(),
        }
    }
}

// ---------------------------------------------------------------------------
// Duplicates
// ---------------------------------------------------------------------------

/// Which same-key record stays canonical. Every extra occurrence is flagged
/// either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    KeepFirst,
    KeepLast,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self::KeepFirst
    }
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeepFirst => write!(f, "keep_first"),
            Self::KeepLast => write!(f, "keep_last"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct DuplicateConfig {
    #[serde(default)]
    pub policy: DuplicatePolicy,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub file: String,
    /// Worksheet name; spreadsheets only. Defaults to the first sheet.
    #[serde(default)]
    pub sheet: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let t = self.tolerance.threshold;
        if !t.is_finite() || t < 0.0 {
            return Err(ReconError::ConfigValidation(format!(
                "tolerance threshold must be a finite non-negative number, got {t}"
            )));
        }

        let layout = &self.layout;
        if layout.min_blank_sep == 0 {
            return Err(ReconError::ConfigValidation(
                "min_blank_sep must be at least 1".into(),
            ));
        }
        if layout.max_header_scan == 0 {
            return Err(ReconError::ConfigValidation(
                "max_header_scan must be at least 1".into(),
            ));
        }
        if layout.header_rows == Some(0) {
            return Err(ReconError::ConfigValidation(
                "header_rows must be at least 1".into(),
            ));
        }
        if let (Some(section), Some(header)) = (layout.section_row, layout.header_rows) {
            if header <= section {
                return Err(ReconError::ConfigValidation(format!(
                    "header_rows ({header}) must be greater than section_row ({section})"
                )));
            }
        }

        // Sources are optional here, but a configured list must be usable
        if self.sources.len() == 1 {
            return Err(ReconError::NotEnoughSources { found: 1 });
        }
        let mut seen = BTreeSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "source for file '{}' has an empty name",
                    source.file
                )));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(ReconError::DuplicateSource(source.name.clone()));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name = "Q3 rate build-up"

[layout]
section_row = 0
header_rows = 4
min_blank_sep = 3
date_windows = false
standalone = false
max_header_scan = 20

[tolerance]
policy = "relative"
threshold = 0.001

[duplicates]
policy = "keep_last"

[[sources]]
name = "baseline"
file = "q3_v1.csv"

[[sources]]
name = "candidate"
file = "q3_v2.xlsx"
sheet = "Rates"
"#;

    #[test]
    fn parse_full() {
        let config = ReconConfig::from_toml(FULL).unwrap();
        assert_eq!(config.name, "Q3 rate build-up");
        assert_eq!(config.layout.section_row, Some(0));
        assert_eq!(config.layout.header_rows, Some(4));
        assert_eq!(config.layout.min_blank_sep, 3);
        assert!(!config.layout.date_windows);
        assert!(!config.layout.standalone);
        assert_eq!(config.layout.max_header_scan, 20);
        assert_eq!(config.tolerance.policy, TolerancePolicy::Relative);
        assert_eq!(config.tolerance.threshold, 0.001);
        assert_eq!(config.duplicates.policy, DuplicatePolicy::KeepLast);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].sheet.as_deref(), Some("Rates"));
        assert!(config.sources[0].sheet.is_none());
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = ReconConfig::from_toml("").unwrap();
        assert_eq!(config.name, "gridrecon");
        assert_eq!(config.layout.section_row, None);
        assert_eq!(config.layout.header_rows, None);
        assert_eq!(config.layout.min_blank_sep, 2);
        assert!(config.layout.date_windows);
        assert!(config.layout.standalone);
        assert_eq!(config.layout.max_header_scan, 12);
        assert_eq!(config.tolerance.policy, TolerancePolicy::Absolute);
        assert_eq!(config.tolerance.threshold, 0.01);
        assert_eq!(config.duplicates.policy, DuplicatePolicy::KeepFirst);
        assert!(config.sources.is_empty());
    }

    #[test]
    fn reject_unknown_policy() {
        let err = ReconConfig::from_toml("[tolerance]\npolicy = \"fuzzy\"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_negative_threshold() {
        let err = ReconConfig::from_toml("[tolerance]\nthreshold = -0.5\n").unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn reject_zero_separator() {
        let err = ReconConfig::from_toml("[layout]\nmin_blank_sep = 0\n").unwrap_err();
        assert!(err.to_string().contains("min_blank_sep"));
    }

    #[test]
    fn reject_header_rows_not_below_section_row() {
        let err =
            ReconConfig::from_toml("[layout]\nsection_row = 3\nheader_rows = 3\n").unwrap_err();
        assert!(err.to_string().contains("greater than section_row"));
    }

    #[test]
    fn reject_single_source() {
        let input = "[[sources]]\nname = \"a\"\nfile = \"a.csv\"\n";
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::NotEnoughSources { found: 1 }));
    }

    #[test]
    fn reject_duplicate_source_names() {
        let input = r#"
[[sources]]
name = "a"
file = "a.csv"

[[sources]]
name = "a"
file = "b.csv"
"#;
        let err = ReconConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn policy_from_str() {
        assert_eq!("truncate".parse::<TolerancePolicy>(), Ok(TolerancePolicy::Truncate));
        assert!("nearest".parse::<TolerancePolicy>().is_err());
    }
}
