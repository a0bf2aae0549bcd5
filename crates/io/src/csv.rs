// CSV/TSV import

use std::io::Read;
use std::path::Path;

use gridrecon_recon::Grid;

use crate::error::LoadError;

pub fn import(path: &Path) -> Result<Grid, LoadError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    log::debug!("{}: sniffed delimiter {:?}", path.display(), delimiter as char);
    import_from_string(path, &content, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<Grid, LoadError> {
    let content = read_file_as_utf8(path)?;
    import_from_string(path, &content, b'\t')
}

const SNIFF_ROWS: usize = 10;

/// Pick the field delimiter for a report export.
///
/// Each candidate parses the leading rows with quoting honoured, so the commas in
/// `"$1,200.00"` or a decimal-comma `1,5` under `;` never count as separators.
/// A candidate needs more than one field on the first row; among those, the one
/// whose rows most often share that width (weighted by the width) wins.
fn sniff_delimiter(content: &str) -> u8 {
    [b',', b';', b'\t', b'|']
        .into_iter()
        .filter_map(|delim| {
            let widths: Vec<usize> = csv::ReaderBuilder::new()
                .delimiter(delim)
                .has_headers(false)
                .flexible(true)
                .from_reader(content.as_bytes())
                .records()
                .take(SNIFF_ROWS)
                .map_while(Result::ok)
                .map(|record| record.len())
                .collect();
            let width = *widths.first()?;
            if width < 2 {
                return None;
            }
            let agreeing = widths.iter().filter(|&&w| w == width).count();
            Some((agreeing * width, delim))
        })
        // ties keep the earlier candidate, comma first
        .fold(None, |best: Option<(usize, u8)>, cand| match best {
            Some(b) if b.0 >= cand.0 => Some(b),
            _ => Some(cand),
        })
        .map_or(b',', |(_, delim)| delim)
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, LoadError> {
    let mut file = std::fs::File::open(path).map_err(|e| LoadError::io(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| LoadError::io(path, e))?;

    // Excel writes a BOM on "CSV UTF-8" exports
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes.drain(..3);
    }

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{}: not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn import_from_string(path: &Path, content: &str, delimiter: u8) -> Result<Grid, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| LoadError::csv(path, e))?;
        rows.push(record.iter().map(|field| field.trim().to_string()).collect());
    }

    Ok(Grid::padded(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Name;Age;City\nAlice;30;Paris\nBob;25;London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "Name,Age,City\nAlice,30,Paris\nBob,25,London\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "Name\tAge\tCity\nAlice\t30\tParis\nBob\t25\tLondon\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_pipe_delimiter() {
        let content = "Name|Age|City\nAlice|30|Paris\nBob|25|London\n";
        assert_eq!(sniff_delimiter(content), b'|');
    }

    #[test]
    fn test_sniff_quoted_currency_keeps_comma() {
        // Thousands separators inside quotes must not win over the real delimiter
        let content = "Channel,Rx,Mx\nRetail,\"$1,200.00\",\"$3,000.00\"\nMail,300,400\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_decimal_comma_export_picks_semicolon() {
        let content = "Channel;Rx;Mx\nRetail;1,5;2,5\nMail;3,0;4,0\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_quoted_newline_counts_as_one_row() {
        let content = "Channel,\"Rx\nBase\",Mx\nRetail,1,2\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_empty_defaults_to_comma() {
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_ragged_rows_are_padded_and_trimmed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        fs::write(&path, "Financial,,\n , Rx ,Mx\nRetail,1\n").unwrap();

        let grid = import(&path).unwrap();
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.cell(1, 0), "");
        assert_eq!(grid.cell(1, 1), "Rx");
        assert_eq!(grid.cell(2, 2), "");
    }

    #[test]
    fn test_bom_is_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.csv");
        fs::write(&path, b"\xEF\xBB\xBFChannel,Rx\nRetail,1\n").unwrap();

        let grid = import(&path).unwrap();
        assert_eq!(grid.cell(0, 0), "Channel");
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // 0x80 is the euro sign in Windows-1252
        fs::write(&path, b"Channel;Rx\nRetail;\x801,200\n").unwrap();

        let grid = import(&path).unwrap();
        assert_eq!(grid.cell(1, 1), "\u{20AC}1,200");
    }

    #[test]
    fn test_tsv_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.tsv");
        fs::write(&path, "Channel\tRx\nRetail\t1,200\n").unwrap();

        let grid = import_tsv(&path).unwrap();
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.cell(1, 1), "1,200");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = import(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
