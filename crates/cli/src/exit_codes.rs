//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 2       | Universal        | CLI usage error (bad args, bad format)   |
//! | 3       | Universal        | File could not be read or written        |
//! | 60-69   | portfolio        | Roster/payment data and config codes     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use parfolio_engine::PortfolioError;
use parfolio_io::ReadError;

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, unsupported file extension, unknown sheet.
pub const EXIT_USAGE: u8 = 2;

/// File could not be opened, decoded or written.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Portfolio (60-69)
// =============================================================================

/// Roster or payment data was rejected: missing columns, bad rows, rejected
/// duplicate keys, or amounts whose sums leave the decimal range. Nothing was applied.
pub const EXIT_SCHEMA: u8 = 60;

/// No client data: the roster has no data rows.
pub const EXIT_EMPTY_ROSTER: u8 = 61;

/// Payments without a matching client were found and `--strict` is set.
pub const EXIT_UNMATCHED: u8 = 62;

/// Config file could not be parsed or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 63;

/// Map an engine error to its exit code.
pub fn portfolio_exit_code(err: &PortfolioError) -> u8 {
    match err {
        PortfolioError::EmptyRoster => EXIT_EMPTY_ROSTER,
        PortfolioError::ConfigParse(_) | PortfolioError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        PortfolioError::MissingColumns { .. }
        | PortfolioError::InvalidRows { .. }
        | PortfolioError::DuplicateKey { .. }
        | PortfolioError::AmountOverflow(_) => EXIT_SCHEMA,
    }
}

/// Map a file read error to its exit code.
pub fn read_exit_code(err: &ReadError) -> u8 {
    match err {
        ReadError::UnsupportedFormat(_) | ReadError::NoSuchSheet(_) => EXIT_USAGE,
        _ => EXIT_IO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parfolio_engine::TableKind;

    #[test]
    fn test_portfolio_codes() {
        assert_eq!(portfolio_exit_code(&PortfolioError::EmptyRoster), EXIT_EMPTY_ROSTER);
        assert_eq!(
            portfolio_exit_code(&PortfolioError::ConfigParse("bad".into())),
            EXIT_INVALID_CONFIG
        );
        let missing = PortfolioError::MissingColumns {
            table: TableKind::Payments,
            columns: vec!["Payment Amount".into()],
        };
        assert_eq!(portfolio_exit_code(&missing), EXIT_SCHEMA);
        let overflow = PortfolioError::AmountOverflow("summing portfolio totals".into());
        assert_eq!(portfolio_exit_code(&overflow), EXIT_SCHEMA);
    }

    #[test]
    fn test_read_codes() {
        assert_eq!(read_exit_code(&ReadError::UnsupportedFormat("a.pdf".into())), EXIT_USAGE);
        assert_eq!(read_exit_code(&ReadError::NoHeader), EXIT_IO);
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_USAGE,
            EXIT_IO,
            EXIT_SCHEMA,
            EXIT_EMPTY_ROSTER,
            EXIT_UNMATCHED,
            EXIT_INVALID_CONFIG,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
