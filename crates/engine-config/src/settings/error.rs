use thiserror::Error;

/// Errors raised while loading or validating settings. All are fatal to the
/// current command.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Every problem found, so they can be fixed in one pass.
    #[error("Invalid settings: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),
}
