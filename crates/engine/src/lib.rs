//! `parfolio-engine` - Portfolio-at-risk classification, payment
//! reconciliation and arrears aggregation.
//!
//! Pure engine crate: receives decoded tables or records, returns reports.
//! No CLI or file IO dependencies.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod store;
pub mod table;

pub use aggregate::aggregate;
pub use classify::classify;
pub use config::{DuplicateKeyPolicy, PortfolioConfig};
pub use error::{PortfolioError, RowIssue, TableKind};
pub use model::{
    AccountRecord, ClientView, IngestSummary, OwnerSummary, ParCategory, ParTotals,
    PaymentRecord, ReconcileOutcome, Report, Roster, UnmatchedPayment,
};
pub use reconcile::reconcile;
pub use store::{PortfolioStore, SharedStore};
pub use table::{Cell, Table};
