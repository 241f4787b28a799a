//! Error types for access registries.
//!
//! Every registry implementation reports failures through the same enum so
//! callers cannot tell (and need not care) which backend answered.

use sharevault_core::{Denial, GrantId};
use sharevault_store::StoreError;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No grant with this id exists.
    #[error("grant not found: {0}")]
    NotFound(GrantId),

    /// The grant is past its expiry or has been revoked.
    #[error("grant has expired or been revoked: {0}")]
    Expired(GrantId),

    /// The caller does not own the grant.
    #[error("caller is not the owner of grant {0}")]
    Unauthorized(GrantId),

    /// The grant is password protected and the password did not match.
    #[error("invalid password for grant {0}")]
    InvalidPassword(GrantId),

    /// A grant must last at least one second.
    #[error("grant duration must be positive")]
    InvalidDuration,

    /// An extension must move the expiry strictly forward.
    #[error("new expiry must be later than the current expiry of grant {0}")]
    InvalidExpiry(GrantId),

    /// The ledger could not be reached or failed transiently.
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The ledger answered with something we could not interpret.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl RegistryError {
    /// Translate a lifecycle denial for grant `id`.
    pub fn denied(id: GrantId, denial: Denial) -> Self {
        match denial {
            Denial::Expired => RegistryError::Expired(id),
            Denial::InvalidPassword => RegistryError::InvalidPassword(id),
            Denial::InvalidExpiry => RegistryError::InvalidExpiry(id),
        }
    }

    /// Stable error code, as used in ledger error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::NotFound(_) => "NotFound",
            RegistryError::Expired(_) => "Expired",
            RegistryError::Unauthorized(_) => "Unauthorized",
            RegistryError::InvalidPassword(_) => "InvalidPassword",
            RegistryError::InvalidDuration => "InvalidDuration",
            RegistryError::InvalidExpiry(_) => "InvalidExpiry",
            RegistryError::Unavailable(_) => "Unavailable",
            RegistryError::Database(_) => "Database",
            RegistryError::Protocol(_) => "Protocol",
        }
    }

    /// Rebuild an error from a ledger error code.
    ///
    /// Returns `None` for codes that are not part of the grant contract.
    pub fn from_code(code: &str, id: GrantId) -> Option<Self> {
        let err = match code {
            "NotFound" => RegistryError::NotFound(id),
            "Expired" => RegistryError::Expired(id),
            "Unauthorized" => RegistryError::Unauthorized(id),
            "InvalidPassword" => RegistryError::InvalidPassword(id),
            "InvalidDuration" => RegistryError::InvalidDuration,
            "InvalidExpiry" => RegistryError::InvalidExpiry(id),
            _ => return None,
        };
        Some(err)
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistryError::Unavailable(_))
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(e: reqwest::Error) -> Self {
        RegistryError::Unavailable(e.to_string())
    }
}

impl From<StoreError> for RegistryError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Database(e) => RegistryError::Database(e),
            other => RegistryError::Unavailable(other.to_string()),
        }
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_roundtrip() {
        let id = GrantId::from_bytes([7; 32]);
        for err in [
            RegistryError::NotFound(id),
            RegistryError::Expired(id),
            RegistryError::Unauthorized(id),
            RegistryError::InvalidPassword(id),
            RegistryError::InvalidDuration,
            RegistryError::InvalidExpiry(id),
        ] {
            let code = err.code();
            let back = RegistryError::from_code(code, id).unwrap();
            assert_eq!(back.code(), code);
        }
        assert!(RegistryError::from_code("Teapot", id).is_none());
    }

    #[test]
    fn test_only_unavailable_is_retryable() {
        let id = GrantId::ZERO;
        assert!(RegistryError::Unavailable("down".into()).is_retryable());
        assert!(!RegistryError::Expired(id).is_retryable());
        assert!(!RegistryError::Protocol("junk".into()).is_retryable());
    }
}
