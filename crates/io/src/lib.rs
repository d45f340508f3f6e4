// File I/O: roster and payment tables from CSV or spreadsheets

pub mod csv;
pub mod xlsx;

use std::path::{Path, PathBuf};

use parfolio_engine::Table;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Extension is not one of the supported table formats.
    #[error("Invalid file format: {0} (expected .xlsx, .xls, .xlsb, .ods, .csv or .tsv)")]
    UnsupportedFormat(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("{0}")]
    Spreadsheet(String),
    #[error("workbook contains no sheets")]
    NoSheets,
    #[error("sheet '{0}' not found")]
    NoSuchSheet(String),
    /// File has no header row at all.
    #[error("file is empty (no header row)")]
    NoHeader,
}

impl ReadError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Supported table file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Spreadsheet,
}

impl TableFormat {
    /// Format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ReadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt" => Ok(Self::Csv),
            "tsv" | "tab" => Ok(Self::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Spreadsheet),
            _ => Err(ReadError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Read a table from any supported file, choosing the reader by extension.
///
/// For spreadsheets, `sheet` selects a worksheet by name; the first one is used otherwise.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table, ReadError> {
    match TableFormat::from_path(path)? {
        TableFormat::Csv => csv::import(path),
        TableFormat::Tsv => csv::import_tsv(path),
        TableFormat::Spreadsheet => xlsx::import_sheet(path, sheet),
    }
}
