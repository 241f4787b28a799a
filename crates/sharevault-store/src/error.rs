//! Error types for the content store.

use thiserror::Error;

/// Errors that can occur during content store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No blob is stored under this content id.
    #[error("content not found: {0}")]
    NotFound(String),

    /// The backing store could not be reached or failed transiently.
    #[error("content store unavailable: {0}")]
    Unavailable(String),

    /// The store refused the request (4xx other than 404).
    #[error("content store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Retrieved bytes do not hash to the requested content id.
    #[error("integrity check failed for {0}")]
    Integrity(String),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Response body could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configured URL was not valid.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

impl StoreError {
    /// Whether retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
