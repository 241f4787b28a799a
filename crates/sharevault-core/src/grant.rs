//! Access grants and their lifecycle.
//!
//! A grant authorises reading one piece of content until it expires or its
//! owner revokes it. Status is never stored: it is evaluated on every read
//! from `is_active`, `expiry_time` and the current time.
//!
//! ```text
//! create ──► Active ──(now > expiry)──► Expired
//!               │
//!               └──(owner revoke)─────► Revoked
//! ```
//!
//! Expired and Revoked grants stay readable for audit but can no longer be
//! verified or extended. Every registry implementation evaluates grants
//! through the functions in this module so the rules cannot drift apart.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::crypto::PasswordDigest;
use crate::types::{ContentId, GrantId, Owner};

/// Domain separation context for grant id derivation.
pub const GRANT_ID_CONTEXT: &str = "sharevault 2024-06 grant id v1";

/// Evaluated state of a grant at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantStatus {
    Active,
    Expired,
    Revoked,
}

impl GrantStatus {
    /// Evaluate from stored fields. Revocation takes precedence over expiry.
    pub fn evaluate(is_active: bool, expiry_time: i64, now: i64) -> Self {
        if !is_active {
            GrantStatus::Revoked
        } else if now > expiry_time {
            GrantStatus::Expired
        } else {
            GrantStatus::Active
        }
    }
}

/// Why a known grant refused an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// Past expiry, or deactivated by the owner.
    Expired,
    /// The grant is password protected and the password did not match.
    InvalidPassword,
    /// An extension did not move the expiry forward.
    InvalidExpiry,
}

/// A stored access grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub id: GrantId,
    pub owner: Owner,
    pub content_id: ContentId,
    /// Unix seconds. The grant is usable while `now <= expiry_time`.
    pub expiry_time: i64,
    /// Present iff the grant is password protected.
    pub password_digest: Option<PasswordDigest>,
    pub access_count: u64,
    pub is_active: bool,
    pub created_at: i64,
}

impl AccessGrant {
    /// Build a fresh, active grant.
    pub fn new(
        id: GrantId,
        owner: Owner,
        content_id: ContentId,
        created_at: i64,
        duration_seconds: u64,
        password_digest: Option<PasswordDigest>,
    ) -> Self {
        let duration = i64::try_from(duration_seconds).unwrap_or(i64::MAX);
        Self {
            id,
            owner,
            content_id,
            expiry_time: created_at.saturating_add(duration),
            password_digest,
            access_count: 0,
            is_active: true,
            created_at,
        }
    }

    /// Whether a password is required.
    pub fn has_password(&self) -> bool {
        self.password_digest.is_some()
    }

    /// Evaluate the lifecycle state at `now`.
    pub fn status(&self, now: i64) -> GrantStatus {
        GrantStatus::evaluate(self.is_active, self.expiry_time, now)
    }

    /// Check whether `password` may read this grant at `now`.
    ///
    /// Expiry is checked before the password so an expired grant reports
    /// `Expired` regardless of the password supplied.
    pub fn check_access(&self, now: i64, password: &str) -> Result<(), Denial> {
        if self.status(now) != GrantStatus::Active {
            return Err(Denial::Expired);
        }

        match &self.password_digest {
            Some(digest) if !digest.verify(password) => Err(Denial::InvalidPassword),
            _ => Ok(()),
        }
    }

    /// Check whether the expiry may be moved to `new_expiry` at `now`.
    pub fn check_extend(&self, now: i64, new_expiry: i64) -> Result<(), Denial> {
        if self.status(now) != GrantStatus::Active {
            return Err(Denial::Expired);
        }
        if new_expiry <= self.expiry_time {
            return Err(Denial::InvalidExpiry);
        }
        Ok(())
    }

    /// Whether `caller` may revoke or extend this grant.
    pub fn is_owned_by(&self, caller: &Owner) -> bool {
        &self.owner == caller
    }

    /// Public, password-free view of the grant.
    pub fn details(&self) -> GrantDetails {
        GrantDetails {
            owner: self.owner.clone(),
            content_id: self.content_id.clone(),
            expiry_time: self.expiry_time,
            has_password: self.has_password(),
        }
    }

    /// Full record for dashboards.
    pub fn audit_record(&self) -> AuditRecord {
        AuditRecord {
            id: self.id,
            content_id: self.content_id.clone(),
            owner: self.owner.clone(),
            expiry_time: self.expiry_time,
            has_password: self.has_password(),
            access_count: self.access_count,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

/// What anyone holding a grant id may learn without a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantDetails {
    pub owner: Owner,
    pub content_id: ContentId,
    pub expiry_time: i64,
    pub has_password: bool,
}

impl GrantDetails {
    /// Whether the grant has passed its expiry at `now`.
    ///
    /// Details do not carry revocation state; use this for display only.
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expiry_time
    }
}

/// Record handed to the external audit/dashboard collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: GrantId,
    pub content_id: ContentId,
    pub owner: Owner,
    pub expiry_time: i64,
    pub has_password: bool,
    pub access_count: u64,
    pub is_active: bool,
    pub created_at: i64,
}

impl AuditRecord {
    /// Evaluate the lifecycle state at `now`.
    pub fn status(&self, now: i64) -> GrantStatus {
        GrantStatus::evaluate(self.is_active, self.expiry_time, now)
    }
}

/// Inputs bound into a new grant id.
#[derive(Debug, Clone, Copy)]
pub struct GrantIdContext<'a> {
    pub owner: &'a Owner,
    pub content_id: &'a ContentId,
    pub duration_seconds: u64,
    pub password_digest: Option<&'a PasswordDigest>,
    pub created_at: i64,
    /// Registry-local sequence number of this creation call.
    pub sequence: u64,
}

/// Derive a fresh grant id for one creation call.
///
/// The creator, content and call context are bound in, together with 16
/// random bytes, so repeated calls with identical arguments never collide.
pub fn derive_grant_id(ctx: &GrantIdContext<'_>) -> GrantId {
    let mut entropy = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut entropy);

    let mut hasher = blake3::Hasher::new_derive_key(GRANT_ID_CONTEXT);
    hasher.update(ctx.owner.as_str().as_bytes());
    hasher.update(&[0]);
    hasher.update(ctx.content_id.as_str().as_bytes());
    hasher.update(&[0]);
    hasher.update(&ctx.duration_seconds.to_be_bytes());
    if let Some(digest) = ctx.password_digest {
        hasher.update(&[1]);
        hasher.update(digest.as_bytes());
    } else {
        hasher.update(&[0]);
    }
    hasher.update(&ctx.created_at.to_be_bytes());
    hasher.update(&ctx.sequence.to_be_bytes());
    hasher.update(&entropy);

    GrantId::from_bytes(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(password: Option<&str>) -> AccessGrant {
        AccessGrant::new(
            GrantId::from_bytes([7; 32]),
            Owner::new("0xowner"),
            ContentId::new("QmTest123"),
            1_000,
            86_400,
            password.map(PasswordDigest::of),
        )
    }

    #[test]
    fn test_new_grant_is_active() {
        let g = grant(None);
        assert_eq!(g.expiry_time, 87_400);
        assert_eq!(g.access_count, 0);
        assert!(g.created_at < g.expiry_time);
        assert_eq!(g.status(1_000), GrantStatus::Active);
    }

    #[test]
    fn test_expiry_boundary() {
        let g = grant(None);
        assert_eq!(g.status(87_400), GrantStatus::Active); // At expiration
        assert_eq!(g.status(87_401), GrantStatus::Expired); // After expiration
    }

    #[test]
    fn test_revoked_takes_precedence() {
        let mut g = grant(None);
        g.is_active = false;
        assert_eq!(g.status(2_000), GrantStatus::Revoked);
        assert_eq!(g.status(100_000), GrantStatus::Revoked);
        assert_eq!(g.check_access(2_000, ""), Err(Denial::Expired));
    }

    #[test]
    fn test_no_password_accepts_anything() {
        let g = grant(None);
        assert_eq!(g.check_access(2_000, ""), Ok(()));
        assert_eq!(g.check_access(2_000, "whatever"), Ok(()));
    }

    #[test]
    fn test_password_checked() {
        let g = grant(Some("secret1"));
        assert!(g.has_password());
        assert_eq!(g.check_access(2_000, "wrong"), Err(Denial::InvalidPassword));
        assert_eq!(g.check_access(2_000, "secret1"), Ok(()));
    }

    #[test]
    fn test_expired_reported_before_password() {
        let g = grant(Some("secret1"));
        assert_eq!(g.check_access(90_000, "wrong"), Err(Denial::Expired));
        assert_eq!(g.check_access(90_000, "secret1"), Err(Denial::Expired));
    }

    #[test]
    fn test_extend_rules() {
        let g = grant(None);
        assert_eq!(g.check_extend(2_000, 100_000), Ok(()));
        assert_eq!(g.check_extend(2_000, 87_400), Err(Denial::InvalidExpiry));
        assert_eq!(g.check_extend(90_000, 200_000), Err(Denial::Expired));
    }

    #[test]
    fn test_details_hide_digest() {
        let g = grant(Some("pw"));
        let details = g.details();
        assert!(details.has_password);
        assert_eq!(details.content_id.as_str(), "QmTest123");

        let json = serde_json::to_value(&details).unwrap();
        assert!(json.get("passwordDigest").is_none());
        assert_eq!(json["expiryTime"], 87_400);
    }

    #[test]
    fn test_audit_record_shape() {
        let g = grant(None);
        let json = serde_json::to_value(g.audit_record()).unwrap();
        for key in [
            "id",
            "contentId",
            "owner",
            "expiryTime",
            "hasPassword",
            "accessCount",
            "isActive",
            "createdAt",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_derived_ids_never_collide() {
        let owner = Owner::new("0xowner");
        let content = ContentId::new("QmTest123");
        let ctx = GrantIdContext {
            owner: &owner,
            content_id: &content,
            duration_seconds: 86_400,
            password_digest: None,
            created_at: 1_000,
            sequence: 1,
        };

        // Identical context, still distinct
        assert_ne!(derive_grant_id(&ctx), derive_grant_id(&ctx));
    }
}
