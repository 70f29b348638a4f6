use thiserror::Error;

/// Failure of a single remote call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RemoteError {
    /// The request never produced an HTTP response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The response body was not valid JSON.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// No reply arrived before the local deadline. The call itself may still
    /// complete on the remote side.
    #[error("No reply within {timeout_ms} ms")]
    NoReply { timeout_ms: u64 },

    /// The call task was torn down before it reported back.
    #[error("Call aborted: {0}")]
    Aborted(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}
