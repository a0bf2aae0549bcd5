// Excel/ODS import (xlsx, xlsm, xls, xlsb, ods)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{Duration, NaiveDate};
use gridrecon_recon::Grid;

use crate::error::LoadError;

/// Import one sheet as text cells. `sheet` defaults to the first sheet.
pub fn import(path: &Path, sheet: Option<&str>) -> Result<Grid, LoadError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| LoadError::workbook(path, e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(wanted) => sheet_names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| LoadError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: wanted.to_string(),
                available: sheet_names.clone(),
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| LoadError::workbook(path, "workbook contains no sheets"))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| LoadError::workbook(path, format!("sheet '{name}': {e}")))?;

    // Range start offset (data may not begin at A1); keep addresses stable
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let (start_row, start_col) = (start_row as usize, start_col as usize);

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row];
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col];
        cells.extend(row.iter().map(cell_text));
        rows.push(cells);
    }

    log::debug!(
        "{}: sheet '{name}' read as {} row(s)",
        path.display(),
        rows.len()
    );
    Ok(Grid::padded(rows))
}

/// Text form of a cell as the report shows it.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(n) => format_float(*n),
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{:?}", e),
        // Assumes the 1900 date system, which nearly all workbooks use
        Data::DateTime(dt) => serial_to_iso(dt.as_f64()),
        Data::DateTimeIso(s) => s.trim().to_string(),
        Data::DurationIso(s) => s.trim().to_string(),
    }
}

fn format_float(n: f64) -> String {
    // Integers without decimals
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn serial_to_iso(serial: f64) -> String {
    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return format_float(serial);
    };
    let days = serial.floor();
    let seconds = ((serial - days) * 86_400.0).round() as i64;
    let Some(date) = epoch.checked_add_signed(Duration::days(days as i64)) else {
        return format_float(serial);
    };
    if seconds == 0 {
        date.format("%Y-%m-%d").to_string()
    } else {
        let datetime = date.and_hms_opt(0, 0, 0).map(|d| d + Duration::seconds(seconds));
        match datetime {
            Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            None => format_float(serial),
        }
    }
}
