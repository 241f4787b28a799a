//! # Sharevault Core
//!
//! Pure primitives for sharevault: identifiers, digests, payload encryption
//! and the access-grant lifecycle.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`GrantId`] - Opaque 32-byte access grant handle (`0x`-prefixed hex)
//! - [`ContentId`] - Content-addressed blob identifier (CIDv1 when computed locally)
//! - [`PasswordDigest`] - One-way SHA-256 digest of a share password
//! - [`AccessGrant`] - A stored grant, with lifecycle evaluation
//! - [`Clock`] - Time source used for expiry checks
//!
//! ## Encryption
//!
//! See the [`encryption`] module for the payload format.

pub mod clock;
pub mod crypto;
pub mod encryption;
pub mod error;
pub mod grant;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use crypto::{PasswordDigest, Sha256Hash};
pub use encryption::{decrypt, decrypt_bytes, encrypt};
pub use error::{CoreError, Result};
pub use grant::{
    derive_grant_id, AccessGrant, AuditRecord, Denial, GrantDetails, GrantIdContext, GrantStatus,
};
pub use types::{ContentId, GrantId, Owner};
