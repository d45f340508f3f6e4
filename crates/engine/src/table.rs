//! Tabular input: header row + typed cells, and the mapping from tables to
//! roster / payment records.
//!
//! Readers (CSV, spreadsheets) live in `parfolio-io`; this module only sees
//! the decoded cells.

use std::str::FromStr;

use log::debug;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::config::{PaymentColumns, RosterColumns};
use crate::error::{PortfolioError, RowIssue, TableKind};
use crate::model::{AccountRecord, PaymentRecord};

/// A decoded cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Identifier form: trimmed text, integral numbers without a fraction
    /// (`1001.0` -> `"1001"`). `None` when blank.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(format!("{n}"))
                }
            }
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => parse_decimal(s),
            Cell::Number(n) => Decimal::from_f64(*n),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
            Cell::Number(n) => (!n.is_nan()).then_some(*n),
        }
    }

    fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
        }
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Header row plus data rows. Rows may be shorter than the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Build from string cells (blank strings become `Cell::Empty`).
    pub fn from_strings<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(Cell::text).collect())
                .collect(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Indices of `names`, or every missing column at once.
    pub fn require_columns<const N: usize>(
        &self,
        table: TableKind,
        names: [&str; N],
    ) -> Result<[usize; N], PortfolioError> {
        let mut missing = Vec::new();
        let mut found = [0usize; N];
        for (slot, name) in found.iter_mut().zip(names) {
            match self.column_index(name) {
                Some(i) => *slot = i,
                None => missing.push(name.to_string()),
            }
        }
        if missing.is_empty() {
            Ok(found)
        } else {
            Err(PortfolioError::MissingColumns { table, columns: missing })
        }
    }

    /// Data rows with their 1-based sheet row number, skipping fully blank rows.
    fn data_rows(&self) -> impl Iterator<Item = (usize, &[Cell])> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.iter().all(Cell::is_empty))
            .map(|(i, row)| (i + 2, row.as_slice()))
    }
}

static EMPTY: Cell = Cell::Empty;

fn cell(row: &[Cell], idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&EMPTY)
}

fn missing(row: usize, column: &str) -> RowIssue {
    RowIssue {
        row,
        column: column.to_string(),
        reason: "missing value".into(),
    }
}

/// Map a roster table to account records.
///
/// Owner and client id are required per row. Arrears and days past due may be
/// blank or unreadable; such records stay in the roster without a bucket.
pub fn roster_from_table(
    table: &Table,
    columns: &RosterColumns,
) -> Result<Vec<AccountRecord>, PortfolioError> {
    let [owner_idx, name_idx, id_idx, arrears_idx, dpd_idx] =
        table.require_columns(TableKind::Roster, columns.required())?;

    let mut records = Vec::new();
    let mut issues = Vec::new();

    for (row_no, row) in table.data_rows() {
        let owner = cell(row, owner_idx).as_key();
        let client_id = cell(row, id_idx).as_key();
        if owner.is_none() {
            issues.push(missing(row_no, &columns.owner));
        }
        if client_id.is_none() {
            issues.push(missing(row_no, &columns.client_id));
        }
        let (Some(owner), Some(client_id)) = (owner, client_id) else {
            continue;
        };

        let arrears_cell = cell(row, arrears_idx);
        let arrears = arrears_cell.as_decimal();
        if arrears.is_none() && !arrears_cell.is_empty() {
            debug!("row {row_no}: unreadable arrears '{}'", arrears_cell.display());
        }
        let dpd_cell = cell(row, dpd_idx);
        let days_past_due = dpd_cell.as_f64();
        if days_past_due.is_none() && !dpd_cell.is_empty() {
            debug!("row {row_no}: unreadable days past due '{}'", dpd_cell.display());
        }

        records.push(AccountRecord {
            owner,
            client_id,
            client_name: cell(row, name_idx).as_key().unwrap_or_default(),
            arrears,
            days_past_due,
        });
    }

    PortfolioError::invalid_rows(TableKind::Roster, issues)?;
    Ok(records)
}

/// Map a payment table to payment records, validating every row first.
///
/// Any missing key, missing or unreadable amount, or amount that is not
/// strictly positive rejects the whole batch.
pub fn payments_from_table(
    table: &Table,
    columns: &PaymentColumns,
) -> Result<Vec<PaymentRecord>, PortfolioError> {
    let [owner_idx, id_idx, amount_idx] =
        table.require_columns(TableKind::Payments, columns.required())?;

    let mut payments = Vec::new();
    let mut issues = Vec::new();

    for (row_no, row) in table.data_rows() {
        let owner = cell(row, owner_idx).as_key();
        let client_id = cell(row, id_idx).as_key();
        let amount_cell = cell(row, amount_idx);

        if owner.is_none() {
            issues.push(missing(row_no, &columns.owner));
        }
        if client_id.is_none() {
            issues.push(missing(row_no, &columns.client_id));
        }
        let amount = match amount_cell.as_decimal() {
            None if amount_cell.is_empty() => {
                issues.push(missing(row_no, &columns.amount));
                None
            }
            None => {
                issues.push(RowIssue {
                    row: row_no,
                    column: columns.amount.clone(),
                    reason: format!("cannot parse amount '{}'", amount_cell.display()),
                });
                None
            }
            Some(a) if a <= Decimal::ZERO => {
                issues.push(RowIssue {
                    row: row_no,
                    column: columns.amount.clone(),
                    reason: format!("amount must be positive, got {a}"),
                });
                None
            }
            Some(a) => Some(a),
        };

        if let (Some(owner), Some(client_id), Some(amount)) = (owner, client_id, amount) {
            payments.push(PaymentRecord { owner, client_id, amount });
        }
    }

    PortfolioError::invalid_rows(TableKind::Payments, issues)?;
    Ok(payments)
}
