use crate::settings::{
    error::SettingsError, raw::RawSettings, validated::Settings, validator::SettingsValidator,
};
use std::path::Path;
use tracing::info;

pub mod error;
pub mod filter;
pub mod raw;
pub mod validated;
pub mod validator;

/// Command-line switches that take precedence over the settings file.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsOverrides {
    pub dry: bool,
    pub sandbox: bool,
}

/// Reads, overrides and validates a settings file.
pub fn load(path: &Path, overrides: SettingsOverrides) -> Result<Settings, SettingsError> {
    info!("Loading settings from {}", path.display());
    let source = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let mut raw = RawSettings::parse(&source)?;
    raw.apply(overrides);
    SettingsValidator::new().validate(raw)
}
