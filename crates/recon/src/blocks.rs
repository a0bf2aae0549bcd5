//! Table block finder: carve a column run into rectangular sub-tables
//! separated by fully blank rows and columns.

use crate::grid::Grid;

/// Inclusive rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

/// Find the blocks inside `area`, ordered top-to-bottom then left-to-right.
///
/// Blank edges are trimmed, then the area is split on fully blank rows; when
/// no row splits it, on fully blank columns. Blank rows above `min_split_row`
/// (inside the header tiers) never split a block.
pub fn find_blocks(grid: &Grid, area: Rect, min_split_row: usize) -> Vec<Rect> {
    let mut out = Vec::new();
    if !grid.is_empty() && area.top <= area.bottom && area.left <= area.right {
        cut(grid, area, min_split_row, &mut out);
    }
    out.sort_by_key(|r| (r.top, r.left));
    out
}

fn cut(grid: &Grid, area: Rect, min_split_row: usize, out: &mut Vec<Rect>) {
    let Some(area) = trim(grid, area) else {
        return;
    };

    let row_bands = bands(area.top, area.bottom, |r| {
        r >= min_split_row && grid.row_is_blank(r, area.left, area.right)
    });
    if row_bands.len() > 1 {
        for (top, bottom) in row_bands {
            cut(grid, Rect { top, bottom, ..area }, min_split_row, out);
        }
        return;
    }

    let col_bands = bands(area.left, area.right, |c| grid.col_is_blank(c, area.top, area.bottom));
    if col_bands.len() > 1 {
        for (left, right) in col_bands {
            cut(grid, Rect { left, right, ..area }, min_split_row, out);
        }
        return;
    }

    out.push(area);
}

/// Shrink `area` to its non-blank bounding box.
fn trim(grid: &Grid, mut area: Rect) -> Option<Rect> {
    while area.top <= area.bottom && grid.row_is_blank(area.top, area.left, area.right) {
        area.top += 1;
    }
    if area.top > area.bottom {
        return None;
    }
    while grid.row_is_blank(area.bottom, area.left, area.right) {
        area.bottom -= 1;
    }
    while grid.col_is_blank(area.left, area.top, area.bottom) {
        area.left += 1;
    }
    while grid.col_is_blank(area.right, area.top, area.bottom) {
        area.right -= 1;
    }
    Some(area)
}

/// Maximal runs of indices in `first..=last` not matched by `is_gap`.
fn bands(first: usize, last: usize, is_gap: impl Fn(usize) -> bool) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = None;
    for i in first..=last {
        match (is_gap(i), start) {
            (true, Some(s)) => {
                out.push((s, i - 1));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, last));
    }
    out
}
