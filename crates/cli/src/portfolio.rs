//! `parfolio report|summary|validate`: roster ingest, payment batches, PAR tables.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use parfolio_engine::table::{payments_from_table, roster_from_table};
use parfolio_engine::{
    ClientView, IngestSummary, ParCategory, ParTotals, PortfolioConfig, PortfolioError,
    PortfolioStore, ReconcileOutcome, Report,
};
use parfolio_io::read_table;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::exit_codes::EXIT_UNMATCHED;
use crate::CliError;

/// Inputs shared by `report` and `summary`.
#[derive(Args)]
pub struct RunArgs {
    /// Roster file (.xlsx, .xls, .xlsb, .ods, .csv, .tsv)
    pub roster: PathBuf,

    /// Payment file to apply. Repeatable; applied in the order given
    #[arg(long, short = 'p', value_name = "FILE")]
    pub payments: Vec<PathBuf>,

    /// Roster worksheet name (default: first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    /// Output JSON to stdout instead of tables
    #[arg(long)]
    pub json: bool,

    /// Write the result to a file (.csv: summary table, otherwise JSON)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Exit non-zero when any payment matched no client
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TableKindArg {
    Roster,
    Payments,
}

/// One applied payment file.
#[derive(Debug, Serialize)]
pub struct BatchOutput {
    pub file: String,
    #[serde(flatten)]
    pub outcome: ReconcileOutcome,
}

/// JSON document for `report` / `summary`.
#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub roster: IngestSummary,
    pub batches: Vec<BatchOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<ClientView>>,
    pub summary: Report,
}

impl RunOutput {
    fn unmatched_count(&self) -> usize {
        self.batches.iter().map(|b| b.outcome.unmatched.len()).sum()
    }
}

// ============================================================================
// report / summary
// ============================================================================

pub fn cmd_report(config: PortfolioConfig, args: RunArgs) -> Result<(), CliError> {
    let include_clients = config.report.include_clients;
    let output = run(config, &args, include_clients)?;
    finish(&output, &args)
}

pub fn cmd_summary(config: PortfolioConfig, args: RunArgs) -> Result<(), CliError> {
    let output = run(config, &args, false)?;
    finish(&output, &args)
}

fn run(config: PortfolioConfig, args: &RunArgs, include_clients: bool) -> Result<RunOutput, CliError> {
    let mut store = PortfolioStore::new(config);

    let roster_table = read_table(&args.roster, args.sheet.as_deref())?;
    let roster = store.ingest(&roster_table)?;
    eprintln!(
        "roster: {} client record(s) for {} account manager(s)",
        roster.records, roster.owners
    );

    let mut batches = Vec::with_capacity(args.payments.len());
    for path in &args.payments {
        let table = read_table(path, None)?;
        let outcome = store.reconcile(&table)?;

        for unmatched in &outcome.unmatched {
            eprintln!("warning: {unmatched}");
        }
        eprintln!(
            "{}: {} payment(s) applied, {} record(s) updated, {} paid off, {} unmatched",
            path.display(),
            outcome.applied,
            outcome.records_updated,
            outcome.paid_off,
            outcome.unmatched.len(),
        );

        batches.push(BatchOutput {
            file: path.display().to_string(),
            outcome,
        });
    }

    let clients = if include_clients { Some(store.clients()?) } else { None };
    let summary = store.aggregate()?;

    Ok(RunOutput {
        roster,
        batches,
        clients,
        summary,
    })
}

fn finish(output: &RunOutput, args: &RunArgs) -> Result<(), CliError> {
    if let Some(ref path) = args.output {
        write_output(output, path)?;
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        println!("{}", to_json(output)?);
    } else {
        if let Some(ref clients) = output.clients {
            print!("{}", render_clients(clients));
            println!();
        }
        print!("{}", render_summary(&output.summary));
    }

    let unmatched = output.unmatched_count();
    if args.strict && unmatched > 0 {
        return Err(CliError {
            code: EXIT_UNMATCHED,
            message: format!("{unmatched} payment(s) matched no client"),
            hint: Some("check the account manager and client id columns of the payment file".into()),
        });
    }
    Ok(())
}

fn to_json(output: &RunOutput) -> Result<String, CliError> {
    serde_json::to_string_pretty(output)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))
}

fn write_output(output: &RunOutput, path: &Path) -> Result<(), CliError> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        parfolio_io::csv::export_report(&output.summary, path)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))
    } else {
        std::fs::write(path, to_json(output)?)
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))
    }
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(
    config: PortfolioConfig,
    file: PathBuf,
    kind: TableKindArg,
    sheet: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let table = read_table(&file, sheet.as_deref())?;

    let (value, line) = match kind {
        TableKindArg::Roster => {
            let records = roster_from_table(&table, &config.roster.columns)?;
            if records.is_empty() {
                return Err(PortfolioError::EmptyRoster.into());
            }
            // Ingest into a scratch store so the duplicate-key policy is checked too.
            let summary = PortfolioStore::new(config).ingest_records(records)?;
            let line = format!(
                "valid: roster with {} client record(s) for {} account manager(s)",
                summary.records, summary.owners
            );
            (serde_json::json!({ "kind": "roster", "valid": true, "roster": summary }), line)
        }
        TableKindArg::Payments => {
            let payments = payments_from_table(&table, &config.payments.columns)?;
            let total: Decimal = payments.iter().map(|p| p.amount).sum();
            (
                serde_json::json!({
                    "kind": "payments",
                    "valid": true,
                    "payments": payments.len(),
                    "total": total,
                }),
                format!("valid: {} payment(s) totalling {total}", payments.len()),
            )
        }
    };

    if json {
        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{text}");
    } else {
        eprintln!("{line}");
    }
    Ok(())
}

// ============================================================================
// Text tables
// ============================================================================

fn render_clients(clients: &[ClientView]) -> String {
    let headers = [
        "Account Manager",
        "Client Name",
        "Client ID",
        "Arrears",
        "Days Past Due",
        "Category",
    ];
    let rows: Vec<Vec<String>> = clients
        .iter()
        .map(|c| {
            vec![
                c.owner.clone(),
                c.client_name.clone(),
                c.client_id.clone(),
                c.arrears.map(|a| a.to_string()).unwrap_or_else(|| "-".into()),
                c.days_past_due.map(format_days).unwrap_or_else(|| "-".into()),
                c.category.map(|k| k.label().to_string()).unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    render_table(&headers, &rows, &[3, 4])
}

fn render_summary(report: &Report) -> String {
    let mut headers = vec!["Account Manager"];
    headers.extend(ParCategory::ALL.iter().map(|c| c.label()));
    headers.push("Total");

    let mut rows: Vec<Vec<String>> = report
        .owners
        .iter()
        .map(|o| totals_row(&o.owner, &o.totals))
        .collect();
    rows.push(totals_row("Portfolio", &report.portfolio));

    render_table(&headers, &rows, &[1, 2, 3, 4])
}

fn totals_row(label: &str, totals: &ParTotals) -> Vec<String> {
    let mut row = vec![label.to_string()];
    row.extend(ParCategory::ALL.iter().map(|c| totals.get(*c).to_string()));
    row.push(totals.total.to_string());
    row
}

/// Whole days print without a fractional part.
fn format_days(days: f64) -> String {
    if days.fract() == 0.0 && days.abs() < 1e15 {
        format!("{}", days as i64)
    } else {
        days.to_string()
    }
}

/// Fixed-width text table; `right` lists the columns aligned to the right.
fn render_table(headers: &[&str], rows: &[Vec<String>], right: &[usize]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&pad_line(headers.iter().copied(), &widths, right));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    for row in rows {
        out.push_str(&pad_line(row.iter().map(String::as_str), &widths, right));
        out.push('\n');
    }
    out
}

fn pad_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize], right: &[usize]) -> String {
    let parts: Vec<String> = cells
        .enumerate()
        .map(|(i, cell)| {
            if right.contains(&i) {
                format!("{cell:>w$}", w = widths[i])
            } else {
                format!("{cell:<w$}", w = widths[i])
            }
        })
        .collect();
    parts.join("  ").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use parfolio_engine::{aggregate, AccountRecord, Roster};

    fn roster() -> Roster {
        Roster::new(vec![
            AccountRecord::new("Mary", "1001", "Alice", Decimal::new(10050, 2), 45.0),
            AccountRecord::new("John", "2001", "Bea", Decimal::new(20, 0), 0.0),
        ])
    }

    #[test]
    fn test_summary_table_has_portfolio_row() {
        let text = render_summary(&aggregate(&roster()).unwrap());
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("Account Manager  PAR 1 (1-30)"));
        assert!(lines[0].ends_with("Total"));
        assert!(lines[2].starts_with("John"));
        assert!(lines[3].starts_with("Mary"));
        assert!(lines[3].ends_with("100.50"));
        assert!(lines[4].starts_with("Portfolio"));
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_client_table_shows_missing_category_as_dash() {
        let text = render_clients(&roster().client_views());
        let john = text.lines().find(|l| l.starts_with("John")).unwrap();
        assert!(john.ends_with('-'));
        let mary = text.lines().find(|l| l.starts_with("Mary")).unwrap();
        assert!(mary.ends_with("PAR 2 (31-60)"));
        assert!(mary.contains(" 45 "));
    }

    #[test]
    fn test_format_days() {
        assert_eq!(format_days(45.0), "45");
        assert_eq!(format_days(12.5), "12.5");
        assert_eq!(format_days(-3.0), "-3");
    }

    #[test]
    fn test_render_table_alignment() {
        let rows = vec![vec!["a".to_string(), "1".to_string()], vec!["bbb".to_string(), "22".to_string()]];
        let text = render_table(&["Name", "N"], &rows, &[1]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Name   N");
        assert_eq!(lines[1], "----  --");
        assert_eq!(lines[2], "a      1");
        assert_eq!(lines[3], "bbb   22");
    }
}
