use std::collections::BTreeMap;

use crate::error::PortfolioError;
use crate::model::{OwnerSummary, ParTotals, Report, Roster};

/// Sum arrears per (owner, category).
///
/// Every owner present in the roster gets a row, even if none of its records
/// currently sit in a bucket; absent buckets read as zero. Records without a
/// bucket or without arrears contribute nothing. Owners are sorted.
///
/// Fails with [`PortfolioError::AmountOverflow`] when a sum leaves the decimal range.
pub fn aggregate(roster: &Roster) -> Result<Report, PortfolioError> {
    let mut groups: BTreeMap<&str, ParTotals> = BTreeMap::new();

    for record in roster {
        let entry = groups.entry(record.owner.as_str()).or_default();
        if let (Some(category), Some(arrears)) = (record.category(), record.arrears) {
            entry.checked_add(category, arrears).ok_or_else(|| {
                PortfolioError::AmountOverflow(format!(
                    "summing {category} arrears for '{}'",
                    record.owner
                ))
            })?;
        }
    }

    let mut portfolio = ParTotals::default();
    let mut owners = Vec::with_capacity(groups.len());
    for (owner, totals) in groups {
        portfolio.checked_merge(&totals).ok_or_else(|| {
            PortfolioError::AmountOverflow("summing portfolio totals".to_string())
        })?;
        owners.push(OwnerSummary {
            owner: owner.to_string(),
            totals,
        });
    }

    Ok(Report { owners, portfolio })
}
