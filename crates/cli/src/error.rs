use engine_processing::store::error::StoreError;
use engine_runtime::error::{BatchError, SessionError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to read or write JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to set up logging: {0}")]
    Logging(String),

    #[error("Missing argument: {0}")]
    MissingArgument(String),

    #[error("{0} record(s) failed, see the log for details")]
    RecordsFailed(usize),
}
