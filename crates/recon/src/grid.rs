//! Rectangular grid of trimmed cell strings, as handed over by a loader.

use crate::classify::is_blank;
use crate::error::ReconError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
    width: usize,
}

impl Grid {
    /// Build a grid from rows that must already share one width.
    pub fn new(rows: Vec<Vec<String>>) -> Result<Self, ReconError> {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        if let Some((row, found)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != width)
            .map(|(i, r)| (i, r.len()))
        {
            return Err(ReconError::RaggedRow { row, expected: width, found });
        }
        Ok(Self { rows, width })
    }

    /// Build a grid from ragged rows, padding short rows with blanks.
    pub fn padded(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { rows, width }
    }

    /// Convenience constructor for literal grids.
    pub fn from_strs(rows: &[&[&str]]) -> Result<Self, ReconError> {
        Self::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Cell text; out-of-range coordinates read as blank.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn is_blank_at(&self, row: usize, col: usize) -> bool {
        is_blank(self.cell(row, col))
    }

    /// True when every cell of `row` in `[left, right]` is blank.
    pub fn row_is_blank(&self, row: usize, left: usize, right: usize) -> bool {
        (left..=right).all(|c| self.is_blank_at(row, c))
    }

    /// True when every cell of `col` in `[top, bottom]` is blank.
    pub fn col_is_blank(&self, col: usize, top: usize, bottom: usize) -> bool {
        (top..=bottom).all(|r| self.is_blank_at(r, col))
    }

    /// True when `col` has any non-blank cell at or below `from_row`.
    pub fn column_has_data(&self, col: usize, from_row: usize) -> bool {
        (from_row..self.height()).any(|r| !self.is_blank_at(r, col))
    }
}

/// Convert column index to letter (0 -> A, 1 -> B, 26 -> AA, etc.)
pub fn col_to_letter(col: usize) -> String {
    let mut result = String::new();
    let mut n = col;
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// A1-style address for a zero-based coordinate.
pub fn cell_ref(row: usize, col: usize) -> String {
    format!("{}{}", col_to_letter(col), row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_rejected() {
        let err = Grid::from_strs(&[&["a", "b"], &["c"]]).unwrap_err();
        match err {
            ReconError::RaggedRow { row, expected, found } => {
                assert_eq!((row, expected, found), (1, 2, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn padded_normalizes_width() {
        let grid = Grid::padded(vec![vec!["a".into()], vec!["b".into(), "c".into(), "d".into()]]);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.cell(0, 2), "");
        assert_eq!(grid.cell(1, 2), "d");
    }

    #[test]
    fn out_of_range_reads_blank() {
        let grid = Grid::from_strs(&[&["x"]]).unwrap();
        assert_eq!(grid.cell(5, 5), "");
        assert!(grid.is_blank_at(0, 1));
    }

    #[test]
    fn blank_row_and_column_checks() {
        let grid = Grid::from_strs(&[&["a", "", ""], &["", "", "b"]]).unwrap();
        assert!(grid.row_is_blank(0, 1, 2));
        assert!(!grid.row_is_blank(1, 0, 2));
        assert!(grid.col_is_blank(1, 0, 1));
        assert!(grid.column_has_data(2, 1));
        assert!(!grid.column_has_data(0, 1));
    }

    #[test]
    fn col_letters() {
        assert_eq!(col_to_letter(0), "A");
        assert_eq!(col_to_letter(25), "Z");
        assert_eq!(col_to_letter(26), "AA");
        assert_eq!(col_to_letter(701), "ZZ");
        assert_eq!(cell_ref(4, 1), "B5");
    }
}
