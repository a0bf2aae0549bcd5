use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum LoadError {
    /// File could not be opened or read.
    Io { path: PathBuf, message: String },
    /// Malformed delimited text.
    Csv { path: PathBuf, message: String },
    /// Workbook could not be opened or a sheet could not be read.
    Workbook { path: PathBuf, message: String },
    /// Requested sheet is not in the workbook.
    SheetNotFound {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },
    /// Extension is not one of the supported formats.
    UnsupportedFormat(PathBuf),
}

impl LoadError {
    pub(crate) fn io(path: &Path, err: impl fmt::Display) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn csv(path: &Path, err: impl fmt::Display) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub(crate) fn workbook(path: &Path, err: impl fmt::Display) -> Self {
        Self::Workbook {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
            Self::Csv { path, message } => {
                write!(f, "{}: invalid delimited text: {message}", path.display())
            }
            Self::Workbook { path, message } => {
                write!(f, "{}: cannot read workbook: {message}", path.display())
            }
            Self::SheetNotFound {
                path,
                sheet,
                available,
            } => write!(
                f,
                "{}: sheet '{sheet}' not found (available: {})",
                path.display(),
                available.join(", ")
            ),
            Self::UnsupportedFormat(path) => write!(
                f,
                "{}: unsupported file type (expected .csv, .tsv, .txt, .xlsx, .xlsm, .xls, .xlsb or .ods)",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LoadError {}
