use crate::settings::filter::FilterRule;
use connectors::{file::csv::settings::CsvSettings, market::http::Credentials};
use engine_core::retry::RetryPolicy;
use model::records::field::{FieldMap, StoreKind};
use std::time::Duration;

/// How much checking happens on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidateLevel {
    /// Duplicate detection only.
    Off,
    /// Record, bonus-range and cross-reference checks; failures are logged
    /// and the record is kept.
    Standard,
    /// As `Standard`, but records failing record or bonus checks are
    /// diverted to the filtered store.
    Strict,
}

impl ValidateLevel {
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(ValidateLevel::Off),
            1 => Some(ValidateLevel::Standard),
            2 => Some(ValidateLevel::Strict),
            _ => None,
        }
    }
}

/// Immutable, validated configuration for one session.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub sandbox: bool,
    pub endpoint: Option<String>,
    pub dry_run: bool,
    /// Every results record must carry this HIT id, when set.
    pub hit_id: Option<String>,
    /// Injected into every results record, when set.
    pub qualification_type_id: Option<String>,
    pub min_bonus: f64,
    pub max_bonus: f64,
    pub validate_level: ValidateLevel,
    pub results_fields: FieldMap,
    pub reference_fields: FieldMap,
    pub fields_case_insensitive: bool,
    pub auto_approve: bool,
    pub filter: Option<FilterRule>,
    pub retry: RetryPolicy,
    pub throttle_interval: Duration,
    pub csv: CsvSettings,
}

impl Settings {
    pub fn field_map(&self, kind: StoreKind) -> &FieldMap {
        match kind {
            StoreKind::Results => &self.results_fields,
            StoreKind::Reference => &self.reference_fields,
        }
    }
}
