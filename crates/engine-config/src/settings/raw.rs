use crate::settings::{SettingsOverrides, error::SettingsError, filter::RawFilter};
use serde::Deserialize;
use std::collections::HashMap;

/// Settings as written in the file. Everything is optional here; defaults
/// and range checks are applied by the validator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawSettings {
    pub access: Option<String>,
    pub secret: Option<String>,
    pub sandbox: Option<bool>,
    pub endpoint: Option<String>,
    pub dry: Option<bool>,
    #[serde(rename = "HITId")]
    pub hit_id: Option<String>,
    #[serde(rename = "QualificationTypeId")]
    pub qualification_type_id: Option<String>,
    pub min_bonus: Option<f64>,
    pub max_bonus: Option<f64>,
    pub validate_level: Option<u8>,
    #[serde(default)]
    pub fields: HashMap<String, String>,
    pub fields_case_insensitive: Option<bool>,
    pub auto_approve: Option<bool>,
    pub filter: Option<RawFilter>,
    pub n_retries: Option<i64>,
    pub retry_interval: Option<i64>,
    pub throttle_interval: Option<i64>,
    pub timeout: Option<i64>,
    pub csv: Option<RawCsv>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawCsv {
    pub delimiter: Option<char>,
    pub quote: Option<char>,
    pub header: Option<bool>,
}

impl RawSettings {
    pub fn parse(source: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(source)?)
    }

    pub fn apply(&mut self, overrides: SettingsOverrides) {
        if overrides.dry {
            self.dry = Some(true);
        }
        if overrides.sandbox {
            self.sandbox = Some(true);
        }
    }
}
