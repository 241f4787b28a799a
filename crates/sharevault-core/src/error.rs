//! Error types for sharevault core.

use thiserror::Error;

/// Errors raised by the core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid grant id: {0}")]
    InvalidGrantId(String),

    #[error("invalid password digest length: {0}")]
    InvalidDigest(usize),

    #[error("encryption failed")]
    EncryptionFailure,

    /// Wrong password, truncated payload and tampered ciphertext all land
    /// here. The variant deliberately carries no detail.
    #[error("decryption failed")]
    DecryptionFailure,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
