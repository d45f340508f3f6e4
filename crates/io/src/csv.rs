// CSV/TSV import, report export

use std::path::Path;

use log::debug;
use parfolio_engine::{Cell, ParCategory, Report, Table};

use crate::ReadError;

/// Candidate field separators, in tie-break order.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Lines looked at when guessing the separator, header included.
const SNIFF_LINES: usize = 10;

pub fn import(path: &Path) -> Result<Table, ReadError> {
    let content = read_text(path)?;
    let delimiter = sniff_delimiter(&content);
    debug!("{}: delimiter {:?}", path.display(), delimiter as char);
    import_from_string(&content, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<Table, ReadError> {
    let content = read_text(path)?;
    import_from_string(&content, b'\t')
}

/// Pick the separator under which the most sample lines split into as many
/// fields as the header. The header must split into at least two fields;
/// remaining ties prefer the wider header, then the earlier candidate.
fn sniff_delimiter(content: &str) -> u8 {
    let lines: Vec<&str> = content.lines().take(SNIFF_LINES).collect();
    let Some((header, sample)) = lines.split_first() else {
        return b',';
    };

    let mut best: Option<(usize, usize, u8)> = None;
    for delimiter in DELIMITERS {
        let width = field_count(header, delimiter);
        if width < 2 {
            continue;
        }
        let agreeing = sample
            .iter()
            .filter(|line| field_count(line, delimiter) == width)
            .count();
        if best.map_or(true, |(a, w, _)| (agreeing, width) > (a, w)) {
            best = Some((agreeing, width, delimiter));
        }
    }
    best.map_or(b',', |(_, _, delimiter)| delimiter)
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(0, |record| record.len())
}

/// Whole file as text: UTF-8 with any BOM dropped, or Windows-1252 when the
/// bytes are not valid UTF-8 (spreadsheet exports on Windows).
pub fn read_text(path: &Path) -> Result<String, ReadError> {
    let bytes = std::fs::read(path).map_err(|e| ReadError::io(path, e))?;

    let (text, malformed) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
    if !malformed {
        return Ok(text.into_owned());
    }

    debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
    let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(&bytes);
    Ok(text.into_owned())
}

/// First record is the header row; every later record is data.
fn import_from_string(content: &str, delimiter: u8) -> Result<Table, ReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(r) => r
            .map_err(|e| ReadError::Parse(e.to_string()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect(),
        None => return Err(ReadError::NoHeader),
    };

    let mut rows = Vec::new();
    for result in records {
        let record = result.map_err(|e| ReadError::Parse(e.to_string()))?;
        rows.push(record.iter().map(Cell::text).collect());
    }

    Ok(Table::new(headers, rows))
}

/// Write the summary table: one row per account manager, one column per bucket, then Total.
pub fn export_report(report: &Report, path: &Path) -> Result<(), ReadError> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| ReadError::io(path, e.into()))?;

    let mut header = vec!["Account Manager".to_string()];
    header.extend(ParCategory::ALL.iter().map(|c| c.label().to_string()));
    header.push("Total".into());
    writer
        .write_record(&header)
        .map_err(|e| ReadError::io(path, e.into()))?;

    for row in &report.owners {
        let mut record = vec![row.owner.clone()];
        record.extend(ParCategory::ALL.iter().map(|c| row.totals.get(*c).to_string()));
        record.push(row.totals.total.to_string());
        writer
            .write_record(&record)
            .map_err(|e| ReadError::io(path, e.into()))?;
    }

    writer.flush().map_err(|e| ReadError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Account Manager;Client ID;Payment Amount\nMary;1;40\nJohn;2;15\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "Account Manager,Client ID,Payment Amount\nMary,1,40\nJohn,2,15\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "Account Manager\tClient ID\tPayment Amount\nMary\t1\t40\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "Account Manager;Client Name;Client ID\n\"Doe, Jane\";\"Okafor, Ade\";1\nBob;\"Lee\";2\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_semicolon_csv_import() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("payments.csv");
        fs::write(&path, "Account Manager;Client ID;Payment Amount\nMary;1;40\n;;\n").unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.headers, ["Account Manager", "Client ID", "Payment Amount"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], Cell::Text("Mary".into()));
        assert_eq!(table.rows[0][2], Cell::Text("40".into()));
        assert!(table.rows[1].iter().all(Cell::is_empty));
    }

    #[test]
    fn test_bom_and_header_whitespace_stripped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        fs::write(&path, "\u{feff} Account Manager ,Client ID\nMary,1\n").unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.headers, ["Account Manager", "Client ID"]);
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        // "Zoë" in Windows-1252
        fs::write(&path, b"Account Manager,Client Name\nMary,Zo\xeb\n").unwrap();

        let table = import(&path).unwrap();
        assert_eq!(table.rows[0][1], Cell::Text("Zoë".into()));
    }

    #[test]
    fn test_empty_file_has_no_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();
        assert!(matches!(import(&path), Err(ReadError::NoHeader)));
    }

    #[test]
    fn test_export_report() {
        use parfolio_engine::{AccountRecord, Roster};
        use rust_decimal::Decimal;

        let roster = Roster::new(vec![
            AccountRecord::new("Mary", "1", "Alice", Decimal::new(10050, 2), 45.0),
            AccountRecord::new("John", "1", "Bea", Decimal::new(20, 0), 3.0),
        ]);
        let report = parfolio_engine::aggregate(&roster).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        export_report(&report, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Account Manager,PAR 1 (1-30),PAR 2 (31-60),PAR 3 (60+),Total");
        assert_eq!(lines[1], "John,20,0,0,20");
        assert_eq!(lines[2], "Mary,0,100.50,0,100.50");
    }

    #[test]
    fn test_sniff_prefers_separator_that_agrees_with_data() {
        // Header splits on both; only semicolons split the data rows the same way.
        let content = "Account Manager,Client;Client ID\nMary;1\nJohn;2\n";
        assert_eq!(sniff_delimiter(content), b';');
        assert_eq!(sniff_delimiter("Account Manager\nMary\n"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_export_to_missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("summary.csv");
        let err = export_report(&parfolio_engine::Report::default(), &path).unwrap_err();
        assert!(matches!(err, ReadError::Io { .. }));
        assert!(err.to_string().contains("summary.csv"));
    }
}
