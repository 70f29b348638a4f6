use connectors::market::error::RemoteError;
use model::operation::Operation;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContextError {
    #[error("A marketplace connection already exists")]
    AlreadyConnected,
}

/// Terminal outcome of a dispatch that did not succeed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// Dry mode: nothing was sent. Not a failure for reporting purposes.
    #[error("Dry run: {0} not sent")]
    DrySkipped(Operation),

    #[error("Not connected to the marketplace service")]
    NotConnected,

    #[error("{operation} for {subject} is already in flight")]
    AlreadyPending { operation: Operation, subject: String },

    #[error("{operation} for {subject} failed after {attempts} attempt(s): {last}")]
    Exhausted {
        operation: Operation,
        subject: String,
        attempts: u32,
        last: RemoteError,
    },
}

impl DispatchError {
    pub fn is_dry_skip(&self) -> bool {
        matches!(self, DispatchError::DrySkipped(_))
    }
}
