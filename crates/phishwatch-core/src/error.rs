//! Error types for the core library.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote API answered with a non-success status.
    #[error("HTTP {status}: {reason}")]
    Status {
        /// Numeric status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// The request did not complete within the fetch timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The response body could not be decoded.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The remote API responded but reported no data.
    #[error("Server returned no data")]
    Rejected,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The poller task is no longer accepting commands.
    #[error("Poller is not running")]
    PollerStopped,

    /// The hosting context has been torn down.
    #[error("Service worker inactive")]
    ContextLost,
}

impl Error {
    /// Whether this error came from talking to the remote API, as opposed to
    /// local storage or configuration.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Status { .. } | Self::Timeout(_) | Self::Malformed(_) | Self::Rejected
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
