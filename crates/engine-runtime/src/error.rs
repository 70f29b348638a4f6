use engine_config::settings::error::SettingsError;
use engine_core::error::{ContextError, DispatchError};
use engine_processing::store::error::StoreError;
use thiserror::Error;

/// Errors that stop a batch before any record is dispatched, or a single
/// call that did not succeed.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The requested combination of arguments is not valid.
    #[error("Invalid batch arguments: {0}")]
    InvalidArguments(String),

    #[error("Not connected to the marketplace service; connect first or run dry")]
    NotConnected,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Top-level errors for one administration session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Connection error: {0}")]
    Context(#[from] ContextError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),
}
