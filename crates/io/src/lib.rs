//! `gridrecon-io`: loads report files into width-normalized text grids.
//!
//! No business normalization happens here: cells are trimmed, rows padded to
//! the widest row, and everything else is left to the reconciliation engine.

pub mod csv;
pub mod error;
pub mod xlsx;

use std::path::Path;

use gridrecon_recon::Grid;

pub use error::LoadError;

/// Load `path` as a grid, dispatching on the file extension.
///
/// `sheet` selects a worksheet in spreadsheet files and is ignored for
/// delimited text.
pub fn load_grid(path: &Path, sheet: Option<&str>) -> Result<Grid, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let grid = match ext.as_str() {
        "csv" | "txt" => csv::import(path)?,
        "tsv" => csv::import_tsv(path)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => xlsx::import(path, sheet)?,
        _ => return Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    };

    if sheet.is_some() && matches!(ext.as_str(), "csv" | "txt" | "tsv") {
        log::warn!("{}: --sheet ignored for delimited text", path.display());
    }
    log::info!(
        "loaded {} ({} x {})",
        path.display(),
        grid.height(),
        grid.width()
    );
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn dispatches_on_extension() {
        let dir = tempdir().unwrap();
        let csv = dir.path().join("a.CSV");
        fs::write(&csv, "Channel,Rx\nRetail,1\n").unwrap();
        assert_eq!(load_grid(&csv, None).unwrap().width(), 2);

        let tsv = dir.path().join("a.tsv");
        // commas inside a tab file are data, not delimiters
        fs::write(&tsv, "Channel\tRx\nRetail\t1,200\n").unwrap();
        assert_eq!(load_grid(&tsv, None).unwrap().cell(1, 1), "1,200");
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_grid(Path::new("report.pdf"), None).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));
        let err = load_grid(Path::new("report"), None).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(_)));
    }
}
