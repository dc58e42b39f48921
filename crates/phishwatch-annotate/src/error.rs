//! Error types for the annotator.

use thiserror::Error;

/// Errors that can occur while annotating.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading cached verdicts failed.
    #[error(transparent)]
    Core(#[from] phishwatch_core::Error),

    /// A row dump could not be decoded.
    #[error("Invalid row data: {0}")]
    Rows(#[from] serde_json::Error),
}

/// Result type for annotator operations.
pub type Result<T> = std::result::Result<T, Error>;
