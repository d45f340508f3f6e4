use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which input table an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Roster,
    Payments,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Roster => write!(f, "roster"),
            Self::Payments => write!(f, "payments"),
        }
    }
}

/// A single rejected row. `row` is the 1-based spreadsheet row (header = row 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    pub row: usize,
    pub column: String,
    pub reason: String,
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}, column '{}': {}", self.row, self.column, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Required column(s) absent from the header row.
    #[error("{table}: missing required column(s): {}", .columns.join(", "))]
    MissingColumns { table: TableKind, columns: Vec<String> },
    /// One or more rows failed validation. Nothing was applied.
    #[error("{table}: {} invalid row(s){}", .issues.len(), first_issue(.issues))]
    InvalidRows { table: TableKind, issues: Vec<RowIssue> },
    /// Duplicate (owner, client_id) in the roster under the `reject` policy.
    #[error("roster: duplicate client '{client_id}' under '{owner}' (rows {})", join_rows(.rows))]
    DuplicateKey { owner: String, client_id: String, rows: Vec<usize> },
    /// Reconcile or report requested with no roster loaded.
    #[error("no client data available; ingest a roster first")]
    EmptyRoster,
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty or clashing column names).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A sum or deduction left the representable decimal range. Nothing was applied.
    #[error("amount out of range while {0}")]
    AmountOverflow(String),
}

impl PortfolioError {
    /// Schema errors reject an input wholesale; the caller's data is at fault.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::MissingColumns { .. } | Self::InvalidRows { .. } | Self::DuplicateKey { .. }
        )
    }

    pub(crate) fn invalid_rows(table: TableKind, issues: Vec<RowIssue>) -> Result<(), Self> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Self::InvalidRows { table, issues })
        }
    }
}

fn first_issue(issues: &[RowIssue]) -> String {
    issues.first().map(|i| format!("; first: {i}")).unwrap_or_default()
}

fn join_rows(rows: &[usize]) -> String {
    rows.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ")
}
