//! Error types for the share workflow.

use sharevault_core::CoreError;
use sharevault_registry::RegistryError;
use sharevault_store::StoreError;
use thiserror::Error;

/// Errors that can occur during share operations.
///
/// Registry and store errors pass through unchanged; use [`ShareError::kind`]
/// to branch on the outcome without caring which backend produced it.
#[derive(Debug, Error)]
pub enum ShareError {
    /// Registry error, exactly as the registry reported it.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Content store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Wrong password or corrupted ciphertext. Never disambiguated.
    #[error("decryption failed")]
    DecryptionFailure,

    /// Payload encryption failed.
    #[error("encryption failed")]
    EncryptionFailure,

    /// Content could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A share URL did not contain a grant id.
    #[error("invalid share handle: {0}")]
    InvalidHandle(String),

    /// A stored password digest was not 32 bytes.
    #[error("malformed password digest ({0} bytes)")]
    InvalidDigest(usize),
}

/// Outcome categories callers can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown grant or content id.
    NotFound,
    /// Past expiry, or revoked.
    Expired,
    /// Mutation attempted by someone other than the owner.
    Unauthorized,
    /// Password did not match the grant.
    InvalidPassword,
    /// Ciphertext could not be opened.
    DecryptionFailure,
    /// A registry or content store could not be reached. Retryable.
    UpstreamUnavailable,
    /// The request itself was malformed.
    Invalid,
    /// A backend answered with something unusable: an unknown protocol
    /// reply, bytes failing their content hash, or a local storage fault.
    Internal,
}

impl ShareError {
    /// Project onto the outcome taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShareError::Registry(e) => match e {
                RegistryError::NotFound(_) => ErrorKind::NotFound,
                RegistryError::Expired(_) => ErrorKind::Expired,
                RegistryError::Unauthorized(_) => ErrorKind::Unauthorized,
                RegistryError::InvalidPassword(_) => ErrorKind::InvalidPassword,
                RegistryError::InvalidDuration | RegistryError::InvalidExpiry(_) => {
                    ErrorKind::Invalid
                }
                RegistryError::Unavailable(_) => ErrorKind::UpstreamUnavailable,
                RegistryError::Database(_) | RegistryError::Protocol(_) => ErrorKind::Internal,
            },
            ShareError::Store(e) => match e {
                StoreError::NotFound(_) => ErrorKind::NotFound,
                StoreError::Rejected { .. } | StoreError::InvalidUrl(_) => ErrorKind::Invalid,
                StoreError::Unavailable(_) => ErrorKind::UpstreamUnavailable,
                StoreError::Integrity(_)
                | StoreError::Database(_)
                | StoreError::Serialization(_)
                | StoreError::Migration(_) => ErrorKind::Internal,
            },
            ShareError::DecryptionFailure => ErrorKind::DecryptionFailure,
            ShareError::EncryptionFailure
            | ShareError::Serialization(_)
            | ShareError::InvalidHandle(_) => ErrorKind::Invalid,
            ShareError::InvalidDigest(_) => ErrorKind::Internal,
        }
    }

    /// Whether retrying the same call later may succeed.
    ///
    /// Defers to the backend that produced the error.
    pub fn is_retryable(&self) -> bool {
        match self {
            ShareError::Registry(e) => e.is_retryable(),
            ShareError::Store(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<CoreError> for ShareError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::DecryptionFailure => ShareError::DecryptionFailure,
            CoreError::EncryptionFailure => ShareError::EncryptionFailure,
            CoreError::InvalidGrantId(s) => ShareError::InvalidHandle(s),
            CoreError::InvalidDigest(n) => ShareError::InvalidDigest(n),
        }
    }
}

/// Result type for share operations.
pub type Result<T> = std::result::Result<T, ShareError>;
