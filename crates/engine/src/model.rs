use rust_decimal::Decimal;
use serde::Serialize;

use crate::classify::classify_days;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Portfolio-at-risk bucket. Accounts with no days past due have no bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParCategory {
    Par1,
    Par2,
    Par3,
}

impl ParCategory {
    pub const ALL: [ParCategory; 3] = [Self::Par1, Self::Par2, Self::Par3];

    /// Report column label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Par1 => "PAR 1 (1-30)",
            Self::Par2 => "PAR 2 (31-60)",
            Self::Par3 => "PAR 3 (60+)",
        }
    }
}

impl std::fmt::Display for ParCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// One client account in the roster.
///
/// `arrears` and `days_past_due` are `None` when the source cell was blank or
/// unreadable. The PAR category is never stored; see [`AccountRecord::category`].
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRecord {
    pub owner: String,
    pub client_id: String,
    pub client_name: String,
    pub arrears: Option<Decimal>,
    pub days_past_due: Option<f64>,
}

impl AccountRecord {
    pub fn new(
        owner: impl Into<String>,
        client_id: impl Into<String>,
        client_name: impl Into<String>,
        arrears: Decimal,
        days_past_due: f64,
    ) -> Self {
        Self {
            owner: owner.into(),
            client_id: client_id.into(),
            client_name: client_name.into(),
            arrears: Some(arrears),
            days_past_due: Some(days_past_due),
        }
    }

    /// Bucket derived from the current `days_past_due`.
    pub fn category(&self) -> Option<ParCategory> {
        classify_days(self.days_past_due)
    }

    pub fn key_matches(&self, owner: &str, client_id: &str) -> bool {
        self.owner == owner && self.client_id == client_id
    }
}

/// One row of a payment batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRecord {
    pub owner: String,
    pub client_id: String,
    pub amount: Decimal,
}

impl PaymentRecord {
    pub fn new(owner: impl Into<String>, client_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            owner: owner.into(),
            client_id: client_id.into(),
            amount,
        }
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Ordered collection of account records, keyed logically by (owner, client_id).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    records: Vec<AccountRecord>,
}

impl Roster {
    pub fn new(records: Vec<AccountRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AccountRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AccountRecord> {
        self.records.iter()
    }

    /// All records sharing the key, in roster order.
    pub fn matching_mut<'a>(
        &'a mut self,
        owner: &'a str,
        client_id: &'a str,
    ) -> impl Iterator<Item = &'a mut AccountRecord> + 'a {
        self.records
            .iter_mut()
            .filter(move |r| r.key_matches(owner, client_id))
    }

    /// Number of distinct owners.
    pub fn owner_count(&self) -> usize {
        let mut owners: Vec<&str> = self.records.iter().map(|r| r.owner.as_str()).collect();
        owners.sort_unstable();
        owners.dedup();
        owners.len()
    }

    /// Listing of every record with its derived category.
    pub fn client_views(&self) -> Vec<ClientView> {
        self.records.iter().map(ClientView::from).collect()
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a AccountRecord;
    type IntoIter = std::slice::Iter<'a, AccountRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Serializable row of the client listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientView {
    pub owner: String,
    pub client_id: String,
    pub client_name: String,
    pub arrears: Option<Decimal>,
    pub days_past_due: Option<f64>,
    pub category: Option<ParCategory>,
}

impl From<&AccountRecord> for ClientView {
    fn from(r: &AccountRecord) -> Self {
        Self {
            owner: r.owner.clone(),
            client_id: r.client_id.clone(),
            client_name: r.client_name.clone(),
            arrears: r.arrears,
            days_past_due: r.days_past_due,
            category: r.category(),
        }
    }
}

/// Counts of records per bucket, plus those in no bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub par1: usize,
    pub par2: usize,
    pub par3: usize,
    pub uncategorized: usize,
}

impl CategoryCounts {
    pub fn record(&mut self, category: Option<ParCategory>) {
        match category {
            Some(ParCategory::Par1) => self.par1 += 1,
            Some(ParCategory::Par2) => self.par2 += 1,
            Some(ParCategory::Par3) => self.par3 += 1,
            None => self.uncategorized += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSummary {
    pub records: usize,
    pub owners: usize,
    pub categories: CategoryCounts,
}

/// A payment whose (owner, client_id) is absent from the roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedPayment {
    /// Position in the batch, 0-based.
    pub index: usize,
    pub owner: String,
    pub client_id: String,
    pub amount: Decimal,
}

impl std::fmt::Display for UnmatchedPayment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Client {} not found under {}", self.client_id, self.owner)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileOutcome {
    /// Payments that matched at least one record.
    pub applied: usize,
    /// Records touched, counting every duplicate-key row.
    pub records_updated: usize,
    /// Records whose arrears reached zero or below in this batch.
    pub paid_off: usize,
    pub unmatched: Vec<UnmatchedPayment>,
}

/// Per-bucket arrears sums with their total.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParTotals {
    pub par1: Decimal,
    pub par2: Decimal,
    pub par3: Decimal,
    pub total: Decimal,
}

impl ParTotals {
    /// Add `amount` to a bucket and to the total. `None` on overflow, in which
    /// case neither field changes.
    pub fn checked_add(&mut self, category: ParCategory, amount: Decimal) -> Option<()> {
        let bucket = self.get(category).checked_add(amount)?;
        let total = self.total.checked_add(amount)?;
        match category {
            ParCategory::Par1 => self.par1 = bucket,
            ParCategory::Par2 => self.par2 = bucket,
            ParCategory::Par3 => self.par3 = bucket,
        }
        self.total = total;
        Some(())
    }

    pub fn get(&self, category: ParCategory) -> Decimal {
        match category {
            ParCategory::Par1 => self.par1,
            ParCategory::Par2 => self.par2,
            ParCategory::Par3 => self.par3,
        }
    }

    pub fn checked_merge(&mut self, other: &ParTotals) -> Option<()> {
        let mut merged = self.clone();
        for category in ParCategory::ALL {
            merged.checked_add(category, other.get(category))?;
        }
        *self = merged;
        Some(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerSummary {
    pub owner: String,
    #[serde(flatten)]
    pub totals: ParTotals,
}

/// Dense owner × category arrears table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub owners: Vec<OwnerSummary>,
    pub portfolio: ParTotals,
}

impl Report {
    pub fn owner(&self, owner: &str) -> Option<&OwnerSummary> {
        self.owners.iter().find(|o| o.owner == owner)
    }
}
