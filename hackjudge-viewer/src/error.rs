//! Viewer error types

use thiserror::Error;

/// Errors raised while synchronizing with the API
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Request could not be sent or the connection dropped
    #[error("Network error: {0}")]
    Network(String),

    /// Server answered with a non-success status
    #[error("Server error {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not a valid snapshot or event
    #[error("Decode error: {0}")]
    Decode(String),

    /// Event stream ended without an error
    #[error("Event stream closed by server")]
    StreamClosed,

    /// Too many consecutive failures; waiting for an explicit retry
    #[error("Synchronization halted: {0}")]
    Halted(String),
}

impl From<reqwest::Error> for ViewerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ViewerError::Decode(err.to_string())
        } else {
            ViewerError::Network(err.to_string())
        }
    }
}
