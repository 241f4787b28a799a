//! # Sharevault Testkit
//!
//! Testing utilities for sharevault.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known digests, content ids and payloads that every backend must agree on
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Share services wired to in-memory or SQLite backends
//!
//! ## Golden Vectors
//!
//! ```rust
//! use sharevault_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, actual) in verify_all_vectors() {
//!     assert!(matches, "{}: {}", name, actual);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sharevault_testkit::generators::ShareParams;
//!
//! proptest! {
//!     #[test]
//!     fn content_survives_sharing(params: ShareParams) {
//!         // create with params, consume, compare
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use sharevault_testkit::fixtures::ShareFixture;
//!
//! async fn example() {
//!     let fixture = ShareFixture::new();
//!     let share = fixture.service.create_share(&1, 60, None).await.unwrap();
//!     fixture.advance(61);
//!     assert!(fixture.recipient("0xBob").consume_share::<u32>(&share.id, None).await.is_err());
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    init_tracing, multi_party_services, sqlite_service, MemoryShareService, ShareFixture,
    SqliteShareService, FIXTURE_START,
};
pub use generators::ShareParams;
pub use vectors::{
    cid_vectors, digest_vectors, payload_vectors, verify_all_vectors, CidVector, DigestVector,
    PayloadVector,
};
