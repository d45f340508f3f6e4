use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info};

use crate::aggregate::aggregate;
use crate::classify::count_categories;
use crate::config::{DuplicateKeyPolicy, PortfolioConfig};
use crate::error::PortfolioError;
use crate::model::{
    AccountRecord, ClientView, IngestSummary, PaymentRecord, ReconcileOutcome, Report, Roster,
};
use crate::reconcile::reconcile;
use crate::table::{payments_from_table, roster_from_table, Table};

/// Holds the current roster and the last applied payment batch.
///
/// Every operation either succeeds completely or leaves the store unchanged.
#[derive(Debug, Default)]
pub struct PortfolioStore {
    config: PortfolioConfig,
    roster: Option<Roster>,
    last_payments: Vec<PaymentRecord>,
}

impl PortfolioStore {
    pub fn new(config: PortfolioConfig) -> Self {
        Self {
            config,
            roster: None,
            last_payments: Vec::new(),
        }
    }

    pub fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    /// Replace the roster with the contents of a roster table.
    pub fn ingest(&mut self, table: &Table) -> Result<IngestSummary, PortfolioError> {
        let records = roster_from_table(table, &self.config.roster.columns)?;
        self.ingest_records(records)
    }

    /// Replace the roster with already-mapped records.
    pub fn ingest_records(
        &mut self,
        records: Vec<AccountRecord>,
    ) -> Result<IngestSummary, PortfolioError> {
        if self.config.duplicate_keys == DuplicateKeyPolicy::Reject {
            check_unique_keys(&records)?;
        }

        let roster = Roster::new(records);
        let summary = IngestSummary {
            records: roster.len(),
            owners: roster.owner_count(),
            categories: count_categories(&roster),
        };
        info!(
            "ingested {} records for {} account managers",
            summary.records, summary.owners
        );
        debug!("categories after ingest: {:?}", summary.categories);

        self.roster = Some(roster);
        self.last_payments.clear();
        Ok(summary)
    }

    /// Validate a payment table in full, then apply it.
    pub fn reconcile(&mut self, table: &Table) -> Result<ReconcileOutcome, PortfolioError> {
        // Checked before the file is read, so an early upload reports the real problem.
        self.roster_mut()?;
        let payments = payments_from_table(table, &self.config.payments.columns)?;
        self.reconcile_records(payments)
    }

    pub fn reconcile_records(
        &mut self,
        payments: Vec<PaymentRecord>,
    ) -> Result<ReconcileOutcome, PortfolioError> {
        let roster = self.roster_mut()?;
        let outcome = reconcile(roster, &payments)?;
        info!(
            "applied {} of {} payments ({} records updated, {} paid off, {} unmatched)",
            outcome.applied,
            payments.len(),
            outcome.records_updated,
            outcome.paid_off,
            outcome.unmatched.len()
        );
        debug!("categories after payments: {:?}", count_categories(roster));
        self.last_payments = payments;
        Ok(outcome)
    }

    /// Owner × category arrears table for the current roster.
    pub fn aggregate(&self) -> Result<Report, PortfolioError> {
        aggregate(self.roster()?)
    }

    /// Every client with its current category.
    pub fn clients(&self) -> Result<Vec<ClientView>, PortfolioError> {
        Ok(self.roster()?.client_views())
    }

    pub fn roster(&self) -> Result<&Roster, PortfolioError> {
        match &self.roster {
            Some(r) if !r.is_empty() => Ok(r),
            _ => Err(PortfolioError::EmptyRoster),
        }
    }

    fn roster_mut(&mut self) -> Result<&mut Roster, PortfolioError> {
        match &mut self.roster {
            Some(r) if !r.is_empty() => Ok(r),
            _ => Err(PortfolioError::EmptyRoster),
        }
    }

    /// The most recent successfully applied payment batch.
    pub fn last_payments(&self) -> &[PaymentRecord] {
        &self.last_payments
    }
}

fn check_unique_keys(records: &[AccountRecord]) -> Result<(), PortfolioError> {
    let mut seen: BTreeMap<(&str, &str), Vec<usize>> = BTreeMap::new();
    for (i, r) in records.iter().enumerate() {
        seen.entry((r.owner.as_str(), r.client_id.as_str()))
            .or_default()
            .push(i);
    }
    match seen.into_iter().find(|(_, idx)| idx.len() > 1) {
        Some(((owner, client_id), idx)) => Err(PortfolioError::DuplicateKey {
            owner: owner.to_string(),
            client_id: client_id.to_string(),
            // Record positions, 1-based
            rows: idx.into_iter().map(|i| i + 1).collect(),
        }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Shared handle
// ---------------------------------------------------------------------------

/// Cloneable handle for hosts that serve concurrent requests.
///
/// All access goes through one mutex, so a payment batch is never observed
/// half-applied and two batches never interleave.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<PortfolioStore>>,
}

impl SharedStore {
    pub fn new(store: PortfolioStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Run `f` with exclusive access to the store.
    pub fn with<R>(&self, f: impl FnOnce(&mut PortfolioStore) -> R) -> R {
        // Store operations never leave partial state behind, so a poisoned
        // lock still guards a consistent store.
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn ingest(&self, table: &Table) -> Result<IngestSummary, PortfolioError> {
        self.with(|s| s.ingest(table))
    }

    pub fn reconcile(&self, table: &Table) -> Result<ReconcileOutcome, PortfolioError> {
        self.with(|s| s.reconcile(table))
    }

    pub fn aggregate(&self) -> Result<Report, PortfolioError> {
        self.with(|s| s.aggregate())
    }

    pub fn clients(&self) -> Result<Vec<ClientView>, PortfolioError> {
        self.with(|s| s.clients())
    }
}
