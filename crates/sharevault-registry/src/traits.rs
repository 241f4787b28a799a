//! Registry trait: the contract every access grant ledger satisfies.
//!
//! The authoritative ledger and the local fallbacks implement the same
//! trait and report the same errors, so the share workflow is written once.

use async_trait::async_trait;
use sharevault_core::{AuditRecord, ContentId, GrantDetails, GrantId, Owner, PasswordDigest};

use crate::error::Result;

/// The Registry trait: async interface for access grants.
///
/// An instance acts on behalf of one caller identity, returned by
/// [`Registry::caller`]. Grants created through it are owned by that
/// caller, and only that caller may revoke or extend them.
///
/// # Design Notes
///
/// - **Status is derived**: expiry and revocation are evaluated on each call.
/// - **Expiry before password**: an expired grant reports `Expired` whatever
///   password is supplied.
/// - **Atomic counting**: concurrent successful verifications never lose an
///   `access_count` increment.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Identity this registry acts as.
    fn caller(&self) -> &Owner;

    // ==================== Lifecycle ====================

    /// Create a grant for `content_id`, active for `duration_seconds` from now.
    ///
    /// Fails with `InvalidDuration` when `duration_seconds` is zero.
    async fn create_access_grant(
        &self,
        content_id: &ContentId,
        duration_seconds: u64,
        password_digest: Option<PasswordDigest>,
    ) -> Result<GrantId>;

    /// Check a password against a grant and count the access.
    ///
    /// Returns the content id on success. For grants without a password the
    /// supplied value is ignored.
    async fn verify_access(&self, id: &GrantId, password: &str) -> Result<ContentId>;

    /// Revoke a grant. Owner only; revoking twice succeeds.
    async fn revoke(&self, id: &GrantId) -> Result<()>;

    /// Move a grant's expiry forward. Owner only.
    async fn extend(&self, id: &GrantId, new_expiry: i64) -> Result<()>;

    // ==================== Reads ====================

    /// Public details of a grant. Does not count as an access.
    async fn get_access_grant_details(&self, id: &GrantId) -> Result<GrantDetails>;

    /// Full audit record of a grant. Does not count as an access.
    async fn audit_record(&self, id: &GrantId) -> Result<AuditRecord>;

    /// Audit records of every grant created by `owner`, oldest first.
    async fn grants_by_owner(&self, owner: &Owner) -> Result<Vec<AuditRecord>>;

    // ==================== Health ====================

    /// Check that the registry is reachable.
    async fn ping(&self) -> Result<()>;
}
