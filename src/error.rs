//! Error types for the roundtable discussion client.

use thiserror::Error;

/// Client-side errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Command issued while the socket is not open. Commands are never
    /// queued; the caller decides whether to surface this or retry.
    #[error("connection is not ready to send commands")]
    ConnectionNotReady,

    /// Socket-level failure
    #[error("connection error: {0}")]
    ConnectionError(String),

    /// Directory Service request failed
    #[error("directory request failed: {0}")]
    Directory(String),

    /// No chatroom view is currently open
    #[error("no active discussion session")]
    NoActiveSession,

    /// Input rejected client-side before any network call
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Directory(err.to_string())
    }
}
