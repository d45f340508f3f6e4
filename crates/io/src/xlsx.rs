// Excel import (xlsx, xls, xlsb, ods)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use log::debug;

use parfolio_engine::{Cell, Table};

use crate::ReadError;

/// Maximum number of data rows to import (prevents DoS from huge files)
const MAX_ROWS: usize = 1_048_576;

/// Import the first worksheet. Row 1 is the header row.
pub fn import(path: &Path) -> Result<Table, ReadError> {
    import_sheet(path, None)
}

/// Import a named worksheet, or the first one when `sheet` is `None`.
pub fn import_sheet(path: &Path, sheet: Option<&str>) -> Result<Table, ReadError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ReadError::Spreadsheet(format!("failed to open {}: {e}", path.display())))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| ReadError::NoSuchSheet(name.to_string()))?,
        None => sheet_names.first().cloned().ok_or(ReadError::NoSheets)?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ReadError::Spreadsheet(format!("failed to read sheet '{sheet_name}': {e}")))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(header_text).collect(),
        None => return Err(ReadError::NoHeader),
    };

    let mut data = Vec::new();
    for row in rows.take(MAX_ROWS) {
        data.push(row.iter().map(to_cell).collect());
    }
    debug!(
        "read {} rows x {} columns from sheet '{sheet_name}' of {}",
        data.len(),
        headers.len(),
        path.display()
    );

    Ok(Table::new(headers, data))
}

fn header_text(data: &Data) -> String {
    match to_cell(data) {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.trim().to_string(),
        Cell::Number(n) => n.to_string(),
    }
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.as_str()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        // Formula errors (#N/A, #DIV/0!) read as blanks, like a missing value.
        Data::Error(_) => Cell::Empty,
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::text(s.as_str()),
        Data::DurationIso(s) => Cell::text(s.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    fn write_roster(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let headers = ["Account Manager", "Client Name", "Client ID", "Arrears", "Days Past Due"];
        for (col, h) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *h).unwrap();
        }
        sheet.write_string(1, 0, "Mary").unwrap();
        sheet.write_string(1, 1, "Alice").unwrap();
        sheet.write_number(1, 2, 1001.0).unwrap();
        sheet.write_number(1, 3, 250.5).unwrap();
        sheet.write_number(1, 4, 45.0).unwrap();
        // Row 3 leaves Days Past Due blank
        sheet.write_string(2, 0, "John").unwrap();
        sheet.write_string(2, 1, "Bea").unwrap();
        sheet.write_string(2, 2, "C-9").unwrap();
        sheet.write_boolean(2, 3, true).unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_import_first_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.xlsx");
        write_roster(&path);

        let table = import(&path).unwrap();
        assert_eq!(table.headers[0], "Account Manager");
        assert_eq!(table.headers[4], "Days Past Due");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], Cell::Text("Mary".into()));
        assert_eq!(table.rows[0][2], Cell::Number(1001.0));
        assert_eq!(table.rows[0][2].as_key().as_deref(), Some("1001"));
        assert_eq!(table.rows[0][3], Cell::Number(250.5));
        assert_eq!(table.rows[1][3], Cell::Text("TRUE".into()));
        assert!(table.rows[1].get(4).map_or(true, Cell::is_empty));
    }

    #[test]
    fn test_import_named_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name("Notes").unwrap();
        let payments = workbook.add_worksheet().set_name("Payments").unwrap();
        payments.write_string(0, 0, "Account Manager").unwrap();
        payments.write_string(0, 1, "Client ID").unwrap();
        payments.write_string(0, 2, "Payment Amount").unwrap();
        payments.write_string(1, 0, "Mary").unwrap();
        payments.write_number(1, 1, 7.0).unwrap();
        payments.write_number(1, 2, 40.0).unwrap();
        workbook.save(&path).unwrap();

        let table = import_sheet(&path, Some("Payments")).unwrap();
        assert_eq!(table.headers, ["Account Manager", "Client ID", "Payment Amount"]);
        assert_eq!(table.rows[0][2], Cell::Number(40.0));

        assert!(matches!(
            import_sheet(&path, Some("Missing")),
            Err(ReadError::NoSuchSheet(name)) if name == "Missing"
        ));
    }

    #[test]
    fn test_import_not_a_workbook() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, "not a zip").unwrap();
        assert!(matches!(import(&path), Err(ReadError::Spreadsheet(_))));
    }
}
