// parfolio CLI - portfolio-at-risk reports from roster and payment files

mod exit_codes;
mod portfolio;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use parfolio_engine::PortfolioError;
use parfolio_io::ReadError;

use exit_codes::{portfolio_exit_code, read_exit_code, EXIT_IO, EXIT_SUCCESS};
use portfolio::{RunArgs, TableKindArg};

#[derive(Parser)]
#[command(name = "parfolio")]
#[command(about = "Portfolio-at-risk reports from loan rosters and payment files")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Config file (TOML). Defaults to ~/.config/parfolio/parfolio.toml when present
    #[arg(long, global = true, env = "PARFOLIO_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log more (-v info, -vv debug). RUST_LOG takes precedence
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a roster, apply payment files in order, print clients and the PAR summary
    #[command(after_help = "\
Examples:
  parfolio report roster.xlsx
  parfolio report roster.xlsx --payments week1.xlsx --payments week2.csv
  parfolio report roster.csv -p payments.csv --json
  parfolio report roster.xlsx -p payments.xlsx --output summary.csv --strict")]
    Report {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Like `report`, but print only the per-account-manager totals
    #[command(after_help = "\
Examples:
  parfolio summary roster.xlsx
  parfolio summary roster.xlsx -p payments.xlsx --json")]
    Summary {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Check a roster or payment file without producing a report
    #[command(after_help = "\
Examples:
  parfolio validate roster.xlsx --kind roster
  parfolio validate payments.csv --kind payments --json")]
    Validate {
        /// File to check (.xlsx, .xls, .xlsb, .ods, .csv, .tsv)
        file: PathBuf,

        /// Which table the file holds
        #[arg(long, value_enum)]
        kind: TableKindArg,

        /// Worksheet name for multi-sheet files
        #[arg(long)]
        sheet: Option<String>,

        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  parfolio-engine ", env!("CARGO_PKG_VERSION"),
    )
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = settings::load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Report { run } => portfolio::cmd_report(config, run),
        Commands::Summary { run } => portfolio::cmd_summary(config, run),
        Commands::Validate { file, kind, sheet, json } => {
            portfolio::cmd_validate(config, file, kind, sheet, json)
        }
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<PortfolioError> for CliError {
    fn from(err: PortfolioError) -> Self {
        let hint = match &err {
            PortfolioError::EmptyRoster => {
                Some("the roster needs at least one data row below the header".to_string())
            }
            PortfolioError::MissingColumns { .. } => {
                Some("header names can be remapped under [roster.columns] / [payments.columns] in the config file".to_string())
            }
            PortfolioError::DuplicateKey { .. } => {
                Some("set duplicate_keys = \"apply_all\" to keep every row".to_string())
            }
            PortfolioError::AmountOverflow(_) => {
                Some("check the arrears and payment amount columns for implausibly large values".to_string())
            }
            _ => None,
        };
        Self { code: portfolio_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<ReadError> for CliError {
    fn from(err: ReadError) -> Self {
        let hint = match &err {
            ReadError::UnsupportedFormat(_) => {
                Some("save the file as .xlsx or .csv".to_string())
            }
            _ => None,
        };
        Self { code: read_exit_code(&err), message: err.to_string(), hint }
    }
}
