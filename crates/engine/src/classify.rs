use crate::model::{CategoryCounts, ParCategory, Roster};

/// Lower bound of PAR 2.
pub const PAR2_FROM_DAYS: f64 = 30.0;
/// Lower bound of PAR 3; open-ended above.
pub const PAR3_FROM_DAYS: f64 = 60.0;

/// Bucket for a days-past-due value.
///
/// Buckets are `(0, 30)`, `[30, 60)` and `[60, inf)`. Any positive value below
/// 30 is PAR 1, fractional days included. Zero, negative and NaN values fall
/// outside every bucket.
pub fn classify(days_past_due: f64) -> Option<ParCategory> {
    if days_past_due.is_nan() || days_past_due <= 0.0 {
        None
    } else if days_past_due < PAR2_FROM_DAYS {
        Some(ParCategory::Par1)
    } else if days_past_due < PAR3_FROM_DAYS {
        Some(ParCategory::Par2)
    } else {
        Some(ParCategory::Par3)
    }
}

/// [`classify`] for a possibly-missing cell.
pub fn classify_days(days_past_due: Option<f64>) -> Option<ParCategory> {
    days_past_due.and_then(classify)
}

/// Tally every record of the roster by its current bucket.
pub fn count_categories(roster: &Roster) -> CategoryCounts {
    let mut counts = CategoryCounts::default();
    for record in roster {
        counts.record(record.category());
    }
    counts
}
