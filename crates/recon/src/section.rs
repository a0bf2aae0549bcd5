//! Section detection: forward-fill the section row across columns, split at
//! hard separators and at columns without data.

use crate::classify::is_blank;
use crate::grid::Grid;

/// Columns `first..=last` owned by one section label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRun {
    pub label: String,
    pub first: usize,
    pub last: usize,
}

/// True when every header cell (`0..data_start`) of `col` is blank.
pub fn header_is_blank(grid: &Grid, col: usize, data_start: usize) -> bool {
    data_start == 0 || grid.col_is_blank(col, 0, data_start - 1)
}

/// Scan the section row left to right. A non-blank cell starts a run that is
/// forward-filled until the next non-blank section cell, a column without
/// data below `data_start`, or `min_blank_sep` consecutive columns with blank
/// headers. Separator columns are left unassigned. A label whose own column
/// carries no data yields no run.
pub fn map_sections(
    grid: &Grid,
    section_row: usize,
    data_start: usize,
    min_blank_sep: usize,
) -> Vec<SectionRun> {
    let width = grid.width();
    let mut runs = Vec::new();
    let mut c = 0;
    while c < width {
        let label = grid.cell(section_row, c);
        if is_blank(label) {
            c += 1;
            continue;
        }

        let mut streak = 0;
        let mut next = c;
        let end = loop {
            if next >= width
                || (next > c && !grid.is_blank_at(section_row, next))
                || !grid.column_has_data(next, data_start)
            {
                break next;
            }
            if next > c && header_is_blank(grid, next, data_start) {
                streak += 1;
                if streak >= min_blank_sep {
                    break next + 1 - streak;
                }
            } else {
                streak = 0;
            }
            next += 1;
        };

        if end > c {
            runs.push(SectionRun {
                label: label.trim().to_string(),
                first: c,
                last: end - 1,
            });
            c = end;
        } else {
            log::debug!("section '{}' at column {c} has no data below the header", label.trim());
            c += 1;
        }
    }
    runs
}

/// Maximal column ranges not covered by `runs` that carry data below
/// `data_start`.
pub fn uncovered_ranges(grid: &Grid, runs: &[SectionRun], data_start: usize) -> Vec<(usize, usize)> {
    let mut covered = vec![false; grid.width()];
    for run in runs {
        for flag in &mut covered[run.first..=run.last] {
            *flag = true;
        }
    }

    let mut ranges = Vec::new();
    let mut c = 0;
    while c < covered.len() {
        if covered[c] {
            c += 1;
            continue;
        }
        let start = c;
        while c < covered.len() && !covered[c] {
            c += 1;
        }
        if (start..c).any(|col| grid.column_has_data(col, data_start)) {
            ranges.push((start, c - 1));
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_fills_until_next_label() {
        let grid = Grid::from_strs(&[
            &["Financial", "", "Volume", ""],
            &["Ch", "Rx", "Ch", "Rx"],
            &["Retail", "1", "Retail", "2"],
        ])
        .unwrap();
        let runs = map_sections(&grid, 0, 2, 2);
        assert_eq!(
            runs,
            vec![
                SectionRun { label: "Financial".into(), first: 0, last: 1 },
                SectionRun { label: "Volume".into(), first: 2, last: 3 },
            ]
        );
    }

    #[test]
    fn hard_separator_ends_run() {
        let grid = Grid::from_strs(&[
            &["Financial", "", "", "", ""],
            &["Ch", "Rx", "", "", "Loose"],
            &["Retail", "1", "x", "y", "5"],
        ])
        .unwrap();
        let runs = map_sections(&grid, 0, 2, 2);
        assert_eq!(runs, vec![SectionRun { label: "Financial".into(), first: 0, last: 1 }]);
        assert_eq!(uncovered_ranges(&grid, &runs, 2), vec![(2, 4)]);
    }

    #[test]
    fn short_blank_streak_stays_in_run() {
        let grid = Grid::from_strs(&[
            &["Financial", "", "", ""],
            &["Ch", "Rx", "", "Mx"],
            &["Retail", "1", "2", "3"],
        ])
        .unwrap();
        let runs = map_sections(&grid, 0, 2, 2);
        assert_eq!(runs, vec![SectionRun { label: "Financial".into(), first: 0, last: 3 }]);
    }

    #[test]
    fn column_without_data_ends_run() {
        let grid = Grid::from_strs(&[
            &["Financial", "", "", ""],
            &["Ch", "Rx", "Note", "Mx"],
            &["Retail", "1", "", "3"],
        ])
        .unwrap();
        let runs = map_sections(&grid, 0, 2, 2);
        assert_eq!(runs, vec![SectionRun { label: "Financial".into(), first: 0, last: 1 }]);
        // column 2 has no data, column 3 does
        assert_eq!(uncovered_ranges(&grid, &runs, 2), vec![(2, 3)]);
    }

    #[test]
    fn label_without_data_is_dropped() {
        let grid = Grid::from_strs(&[&["Orphan", "Kept"], &["h", "h"], &["", "1"]]).unwrap();
        let runs = map_sections(&grid, 0, 2, 2);
        assert_eq!(runs, vec![SectionRun { label: "Kept".into(), first: 1, last: 1 }]);
    }

    #[test]
    fn blank_section_row_yields_nothing() {
        let grid = Grid::from_strs(&[&["", ""], &["a", "b"], &["1", "2"]]).unwrap();
        assert!(map_sections(&grid, 0, 2, 2).is_empty());
        assert_eq!(uncovered_ranges(&grid, &[], 2), vec![(0, 1)]);
    }
}
