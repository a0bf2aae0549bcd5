//! Record builder: turn one source grid into a labelled record stream.

use crate::blocks::{find_blocks, Rect};
use crate::classify::{date_token, is_blank, is_value_cell, parse_numeric};
use crate::config::LayoutConfig;
use crate::error::ReconError;
use crate::grid::{cell_ref, col_to_letter, Grid};
use crate::header::{resolve_header, HeaderLayout};
use crate::model::{BlockInfo, Extraction, LayoutInfo, Record, RunInfo, Warning, WarningKind, STANDALONE};
use crate::section::{map_sections, uncovered_ranges, SectionRun};
use crate::tiers::{extract_tiers, BlockTiers};

/// Infer layout and build records for one source.
pub fn extract(source: &str, grid: &Grid, layout: &LayoutConfig) -> Result<Extraction, ReconError> {
    let header = resolve_header(source, grid, layout)?;
    let mut warnings = Vec::new();

    let mut runs = match header.section_row {
        Some(row) => {
            let runs = map_sections(grid, row, header.header_rows, layout.min_blank_sep);
            if runs.is_empty() && !grid.is_empty() && grid.row_is_blank(row, 0, grid.width() - 1) {
                log::warn!("{source}: section row {} is blank", row + 1);
                warnings.push(Warning {
                    kind: WarningKind::HeaderDetection,
                    source: source.to_string(),
                    row: Some(row),
                    col: None,
                    message: format!("section row {} is blank", row + 1),
                });
            }
            runs
        }
        None => Vec::new(),
    };

    for (first, last) in uncovered_ranges(grid, &runs, header.header_rows) {
        if layout.standalone {
            runs.push(SectionRun {
                label: STANDALONE.to_string(),
                first,
                last,
            });
        } else {
            log::warn!(
                "{source}: columns {}-{} carry data outside any section",
                col_to_letter(first),
                col_to_letter(last)
            );
            warnings.push(Warning {
                kind: WarningKind::HeaderDetection,
                source: source.to_string(),
                row: header.section_row,
                col: Some(first),
                message: format!(
                    "columns {}-{} have data but no section label (standalone disabled)",
                    col_to_letter(first),
                    col_to_letter(last)
                ),
            });
        }
    }
    runs.sort_by_key(|r| r.first);

    let mut records = Vec::new();
    let mut run_infos = Vec::with_capacity(runs.len());
    for run in &runs {
        let info = extract_run(source, grid, &header, layout, run, &mut records, &mut warnings);
        run_infos.push(info);
    }
    records.sort_by_key(|r: &Record| (r.row, r.col));

    let block_count: usize = run_infos.iter().map(|r| r.blocks.len()).sum();
    log::debug!(
        "{source}: {} run(s), {block_count} block(s), {} record(s)",
        run_infos.len(),
        records.len()
    );

    Ok(Extraction {
        source: source.to_string(),
        layout: LayoutInfo {
            section_row: header.section_row,
            header_rows: header.header_rows,
            runs: run_infos,
        },
        records,
        warnings,
    })
}

fn extract_run(
    source: &str,
    grid: &Grid,
    header: &HeaderLayout,
    layout: &LayoutConfig,
    run: &SectionRun,
    records: &mut Vec<Record>,
    warnings: &mut Vec<Warning>,
) -> RunInfo {
    let top = header.section_row.map(|r| r + 1).unwrap_or(0);
    let mut blocks = Vec::new();
    if top < grid.height() {
        let area = Rect {
            top,
            bottom: grid.height() - 1,
            left: run.first,
            right: run.last,
        };
        for block in find_blocks(grid, area, header.header_rows) {
            let tiers = extract_tiers(grid, &block, layout.date_windows, layout.header_rows);
            if !tiers.has_labels() && tiers.data_start <= block.bottom {
                log::warn!("{source}: block at {} has no label rows", cell_ref(block.top, block.left));
                warnings.push(Warning {
                    kind: WarningKind::HeaderDetection,
                    source: source.to_string(),
                    row: Some(block.top),
                    col: Some(block.left),
                    message: format!(
                        "block at {} has no label rows; group path left empty",
                        cell_ref(block.top, block.left)
                    ),
                });
            }
            let before = records.len();
            let builder = BlockBuilder {
                source,
                grid,
                header,
                date_windows: layout.date_windows,
                run,
                block: &block,
                tiers: &tiers,
            };
            builder.build(records, warnings);
            blocks.push(BlockInfo {
                top: block.top,
                bottom: block.bottom,
                left: block.left,
                right: block.right,
                label_rows: tiers.label_rows.clone(),
                data_start: tiers.data_start,
                records: records.len() - before,
            });
        }
    }
    RunInfo {
        label: run.label.clone(),
        first: run.first,
        last: run.last,
        blocks,
    }
}

struct BlockBuilder<'a> {
    source: &'a str,
    grid: &'a Grid,
    header: &'a HeaderLayout,
    date_windows: bool,
    run: &'a SectionRun,
    block: &'a Rect,
    tiers: &'a BlockTiers,
}

impl BlockBuilder<'_> {
    fn build(&self, records: &mut Vec<Record>, warnings: &mut Vec<Warning>) {
        for row in self.tiers.data_start..=self.block.bottom {
            let Some(first) = (self.block.left..=self.block.right)
                .find(|&c| is_value_cell(self.grid.cell(row, c)))
            else {
                continue;
            };
            let channel = self.channel(row, first);

            for col in first..=self.block.right {
                let text = self.grid.cell(row, col).trim();
                if !is_value_cell(text) {
                    continue;
                }
                let value_num = parse_numeric(text);
                if value_num.is_none() {
                    log::warn!("{}: {} looks numeric but does not parse: {text:?}", self.source, cell_ref(row, col));
                    warnings.push(Warning {
                        kind: WarningKind::CellParse,
                        source: self.source.to_string(),
                        row: Some(row),
                        col: Some(col),
                        message: format!("{} looks numeric but does not parse: {text:?}", cell_ref(row, col)),
                    });
                }
                let (metric, period) = self.column_labels(col);
                records.push(Record {
                    source: self.source.to_string(),
                    section: self.run.label.clone(),
                    group_path: self.tiers.group_path(col),
                    channel: channel.clone(),
                    metric,
                    period,
                    value_text: text.to_string(),
                    value_num,
                    row,
                    col,
                    cell: cell_ref(row, col),
                });
            }
        }
    }

    /// Nearest non-blank, non-value cell left of the row's first value.
    fn channel(&self, row: usize, first: usize) -> String {
        (self.run.first..first)
            .rev()
            .map(|c| self.grid.cell(row, c))
            .find(|cell| !is_blank(cell) && !is_value_cell(cell))
            .map(|cell| cell.trim().to_string())
            .unwrap_or_default()
    }

    /// Header rows above `col`, nearest first. A block with label rows only
    /// sees its own; a bare block reads the global header tiers above it
    /// (section row excluded).
    fn header_rows_above(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        if self.tiers.has_labels() {
            return Box::new((self.block.top..self.tiers.data_start).rev());
        }
        let global_end = self.block.top.min(self.header.header_rows);
        Box::new(
            (0..global_end)
                .rev()
                .filter(move |&r| Some(r) != self.header.section_row),
        )
    }

    /// Metric is the nearest non-date header text; period is the nearest date
    /// token, falling back to the nearest header text.
    fn column_labels(&self, col: usize) -> (String, String) {
        let mut metric = None;
        let mut period = None;
        let mut nearest = None;
        for r in self.header_rows_above() {
            let cell = self.grid.cell(r, col);
            if is_blank(cell) {
                continue;
            }
            let text = cell.trim();
            if nearest.is_none() {
                nearest = Some(text.to_string());
            }
            match date_token(text).filter(|_| self.date_windows) {
                Some(token) => {
                    if period.is_none() {
                        period = Some(token);
                    }
                }
                None => {
                    if metric.is_none() {
                        metric = Some(text.to_string());
                    }
                }
            }
            if metric.is_some() && period.is_some() {
                break;
            }
        }
        let period = period.or_else(|| nearest.clone()).unwrap_or_default();
        (metric.unwrap_or_default(), period)
    }
}
