//! Label tiers of a block: the header rows between the block top and its
//! first data row, forward-filled across the block's columns.

use crate::blocks::Rect;
use crate::classify::{date_token, has_alpha, is_blank};
use crate::grid::Grid;
use crate::header::is_data_row;

/// Tiers beyond this many only feed metric and period lookup.
pub const MAX_GROUP_TIERS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTiers {
    pub label_rows: Vec<usize>,
    /// First data row; `block.bottom + 1` when the block has none.
    pub data_start: usize,
    /// One forward-filled row per label row, indexed by `col - block.left`.
    filled: Vec<Vec<String>>,
    left: usize,
}

impl BlockTiers {
    /// Non-empty tier labels over `col`, outermost first, at most three.
    pub fn group_path(&self, col: usize) -> Vec<String> {
        let Some(offset) = col.checked_sub(self.left) else {
            return Vec::new();
        };
        self.filled
            .iter()
            .take(MAX_GROUP_TIERS)
            .filter_map(|row| row.get(offset))
            .filter(|label| !label.is_empty())
            .cloned()
            .collect()
    }

    pub fn has_labels(&self) -> bool {
        !self.label_rows.is_empty()
    }
}

fn is_label_row(grid: &Grid, row: usize, block: &Rect, date_windows: bool) -> bool {
    (block.left..=block.right).any(|c| {
        let cell = grid.cell(row, c);
        has_alpha(cell) || (date_windows && date_token(cell).is_some())
    })
}

/// Scan the block from its top: rows carrying text (or period tokens) are label
/// rows; the first numeric-majority row ends the scan.
///
/// With an explicit `header_rows`, every non-blank row above it is a label row
/// even when numeric (account codes, plain years), and data starts no earlier.
pub fn extract_tiers(
    grid: &Grid,
    block: &Rect,
    date_windows: bool,
    header_rows: Option<usize>,
) -> BlockTiers {
    let mut label_rows = Vec::new();
    let mut data_start = block.bottom + 1;
    for r in block.top..=block.bottom {
        if header_rows.is_some_and(|h| r < h) {
            if !grid.row_is_blank(r, block.left, block.right) {
                label_rows.push(r);
            }
            continue;
        }
        if is_data_row(grid, r, block.left, block.right) {
            data_start = r;
            break;
        }
        if is_label_row(grid, r, block, date_windows) {
            label_rows.push(r);
        }
    }

    let filled = label_rows
        .iter()
        .map(|&r| {
            let mut last = String::new();
            (block.left..=block.right)
                .map(|c| {
                    let cell = grid.cell(r, c);
                    if !is_blank(cell) {
                        // period labels are stored in their normalized form
                        last = match date_token(cell).filter(|_| date_windows) {
                            Some(token) => token,
                            None => cell.trim().to_string(),
                        };
                    }
                    last.clone()
                })
                .collect()
        })
        .collect();

    BlockTiers {
        label_rows,
        data_start,
        filled,
        left: block.left,
    }
}
