use serde::Deserialize;

use crate::error::PortfolioError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortfolioConfig {
    pub roster: RosterConfig,
    pub payments: PaymentsConfig,
    /// What to do when the roster holds the same (owner, client_id) twice.
    pub duplicate_keys: DuplicateKeyPolicy,
    pub report: ReportConfig,
}

// ---------------------------------------------------------------------------
// Duplicate keys
// ---------------------------------------------------------------------------

/// Handling of duplicate (owner, client_id) keys in an ingested roster.
///
/// `ApplyAll` keeps every row; a payment for that key is then deducted from
/// each of them. `Reject` refuses the roster at ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    #[default]
    ApplyAll,
    Reject,
}

impl std::fmt::Display for DuplicateKeyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApplyAll => write!(f, "apply_all"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RosterConfig {
    pub columns: RosterColumns,
}

/// Header names of the roster sheet.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RosterColumns {
    pub owner: String,
    pub client_name: String,
    pub client_id: String,
    pub arrears: String,
    pub days_past_due: String,
}

impl Default for RosterColumns {
    fn default() -> Self {
        Self {
            owner: "Account Manager".into(),
            client_name: "Client Name".into(),
            client_id: "Client ID".into(),
            arrears: "Arrears".into(),
            days_past_due: "Days Past Due".into(),
        }
    }
}

impl RosterColumns {
    pub fn required(&self) -> [&str; 5] {
        [
            self.owner.as_str(),
            self.client_name.as_str(),
            self.client_id.as_str(),
            self.arrears.as_str(),
            self.days_past_due.as_str(),
        ]
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaymentsConfig {
    pub columns: PaymentColumns,
}

/// Header names of a payment sheet.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaymentColumns {
    pub owner: String,
    pub client_id: String,
    pub amount: String,
}

impl Default for PaymentColumns {
    fn default() -> Self {
        Self {
            owner: "Account Manager".into(),
            client_id: "Client ID".into(),
            amount: "Payment Amount".into(),
        }
    }
}

impl PaymentColumns {
    pub fn required(&self) -> [&str; 3] {
        [self.owner.as_str(), self.client_id.as_str(), self.amount.as_str()]
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Include the per-client listing alongside the summary table.
    pub include_clients: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { include_clients: true }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PortfolioConfig {
    pub fn from_toml(input: &str) -> Result<Self, PortfolioError> {
        let config: PortfolioConfig =
            toml::from_str(input).map_err(|e| PortfolioError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PortfolioError> {
        check_columns("roster", &self.roster.columns.required())?;
        check_columns("payments", &self.payments.columns.required())?;
        Ok(())
    }
}

fn check_columns(table: &str, columns: &[&str]) -> Result<(), PortfolioError> {
    for (i, name) in columns.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(PortfolioError::ConfigValidation(format!(
                "{table}: column names must not be empty"
            )));
        }
        if columns[..i].contains(name) {
            return Err(PortfolioError::ConfigValidation(format!(
                "{table}: column '{name}' mapped to more than one field"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
