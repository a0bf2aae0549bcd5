use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad threshold, duplicate source name, etc.).
    ConfigValidation(String),
    /// A grid row whose width differs from the first row.
    RaggedRow { row: usize, expected: usize, found: usize },
    /// Reconciliation needs a baseline plus at least one other source.
    NotEnoughSources { found: usize },
    /// Two sources share the same name.
    DuplicateSource(String),
    /// Configured section row lies outside the grid.
    SectionRowOutOfRange { source: String, row: usize, height: usize },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::RaggedRow { row, expected, found } => write!(
                f,
                "row {} has {found} cell(s), expected {expected} (grid must be width-normalized)",
                row + 1
            ),
            Self::NotEnoughSources { found } => {
                write!(f, "at least 2 sources are required, found {found}")
            }
            Self::DuplicateSource(name) => write!(f, "duplicate source name: '{name}'"),
            Self::SectionRowOutOfRange { source, row, height } => write!(
                f,
                "source '{source}': section row {row} is outside the grid ({height} row(s))"
            ),
        }
    }
}

impl std::error::Error for ReconError {}
