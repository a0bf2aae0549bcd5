//! Header-tier detection: how many rows form the header, and which of them
//! carries section labels.

use crate::classify::{date_token, is_blank, is_value_cell};
use crate::config::LayoutConfig;
use crate::error::ReconError;
use crate::grid::Grid;

/// Header rows used when no data row shows up within the scan window.
const FALLBACK_HEADER_ROWS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLayout {
    pub section_row: Option<usize>,
    /// Rows `0..header_rows` are header tiers; data starts at `header_rows`.
    pub header_rows: usize,
}

/// A row is data when at least half of its non-blank cells in `[left, right]`
/// are numbers, with at least one number. Year and date-window tokens never
/// count as numbers here, so a period header row is not mistaken for data.
pub fn is_data_row(grid: &Grid, row: usize, left: usize, right: usize) -> bool {
    let mut numeric = 0usize;
    let mut non_blank = 0usize;
    for c in left..=right {
        let cell = grid.cell(row, c);
        if is_blank(cell) {
            continue;
        }
        non_blank += 1;
        if date_token(cell).is_none() && is_value_cell(cell) {
            numeric += 1;
        }
    }
    numeric >= 1 && numeric * 2 >= non_blank
}

/// Index of the first data row within the first `max_scan` rows; falls back to
/// three header rows (or the whole grid when shorter).
pub fn detect_header_rows(grid: &Grid, max_scan: usize) -> usize {
    if grid.is_empty() {
        return 0;
    }
    let right = grid.width() - 1;
    (0..grid.height().min(max_scan))
        .find(|&r| is_data_row(grid, r, 0, right))
        .unwrap_or_else(|| FALLBACK_HEADER_ROWS.min(grid.height()))
}

/// First header row with any non-blank cell, excluding the last header row:
/// a section row always sits above at least one label tier.
pub fn first_non_blank_row(grid: &Grid, header_rows: usize) -> Option<usize> {
    if grid.is_empty() {
        return None;
    }
    let right = grid.width() - 1;
    (0..header_rows.min(grid.height()).saturating_sub(1)).find(|&r| !grid.row_is_blank(r, 0, right))
}

/// Resolve section row and header rows from explicit settings or detection.
pub fn resolve_header(
    source: &str,
    grid: &Grid,
    layout: &LayoutConfig,
) -> Result<HeaderLayout, ReconError> {
    if let Some(row) = layout.section_row {
        if row >= grid.height() {
            return Err(ReconError::SectionRowOutOfRange {
                source: source.to_string(),
                row,
                height: grid.height(),
            });
        }
    }

    let mut header_rows = match layout.header_rows {
        Some(n) => n.min(grid.height()),
        None => detect_header_rows(grid, layout.max_header_scan),
    };

    let section_row = match layout.section_row {
        Some(row) => {
            if row >= header_rows {
                log::debug!(
                    "{source}: section row {row} lies below detected header ({header_rows} rows), extending header"
                );
                header_rows = row + 1;
            }
            Some(row)
        }
        None => first_non_blank_row(grid, header_rows),
    };

    log::debug!("{source}: header_rows={header_rows} section_row={section_row:?}");
    Ok(HeaderLayout {
        section_row,
        header_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> Grid {
        Grid::from_strs(&[
            &["Financial", ""],
            &["", "Rx"],
            &["", "Base"],
            &["Channel", "2027"],
            &["Retail", "$1,200.00"],
            &["Mail", "300"],
        ])
        .unwrap()
    }

    #[test]
    fn year_row_is_not_data() {
        let grid = report();
        assert!(!is_data_row(&grid, 3, 0, 1));
        assert!(is_data_row(&grid, 4, 0, 1));
    }

    #[test]
    fn detects_first_data_row() {
        assert_eq!(detect_header_rows(&report(), 12), 4);
    }

    #[test]
    fn scan_window_limits_detection() {
        assert_eq!(detect_header_rows(&report(), 4), 3);
    }

    #[test]
    fn all_text_grid_falls_back() {
        let grid = Grid::from_strs(&[&["a"], &["b"], &["c"], &["d"], &["e"]]).unwrap();
        assert_eq!(detect_header_rows(&grid, 12), 3);
        let short = Grid::from_strs(&[&["a"], &["b"]]).unwrap();
        assert_eq!(detect_header_rows(&short, 12), 2);
    }

    #[test]
    fn auto_section_row_is_first_non_blank() {
        let grid = Grid::from_strs(&[&["", ""], &["Sec", ""], &["x", "y"], &["r", "1"]]).unwrap();
        let header = resolve_header("a", &grid, &LayoutConfig::default()).unwrap();
        assert_eq!(header.header_rows, 3);
        assert_eq!(header.section_row, Some(1));
    }

    #[test]
    fn single_header_row_is_not_a_section_row() {
        let grid = Grid::from_strs(&[&["Ch", "Rx"], &["Retail", "1"]]).unwrap();
        let header = resolve_header("a", &grid, &LayoutConfig::default()).unwrap();
        assert_eq!(header.header_rows, 1);
        assert_eq!(header.section_row, None);
    }

    #[test]
    fn explicit_section_row_extends_header() {
        let grid = report();
        let layout = LayoutConfig {
            section_row: Some(5),
            ..LayoutConfig::default()
        };
        let header = resolve_header("a", &grid, &layout).unwrap();
        assert_eq!(header.header_rows, 6);
    }

    #[test]
    fn section_row_out_of_range() {
        let layout = LayoutConfig {
            section_row: Some(10),
            ..LayoutConfig::default()
        };
        let err = resolve_header("base", &report(), &layout).unwrap_err();
        assert!(matches!(err, ReconError::SectionRowOutOfRange { row: 10, height: 6, .. }));
    }

    #[test]
    fn empty_grid_has_no_header() {
        let grid = Grid::default();
        let header = resolve_header("a", &grid, &LayoutConfig::default()).unwrap();
        assert_eq!(header.header_rows, 0);
        assert_eq!(header.section_row, None);
    }
}
