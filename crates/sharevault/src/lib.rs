//! # Sharevault
//!
//! Time-limited, optionally password-protected sharing of data held in
//! content-addressed storage.
//!
//! ## Overview
//!
//! An owner shares a piece of content for a fixed duration. The content is
//! serialized, encrypted when a password is given, and stored under its
//! content id. A grant on the registry ties that id to an expiry and a
//! password digest. Recipients get a URL with the grant id; consuming it
//! verifies the grant first, then fetches and decrypts the content.
//!
//! ## Key Concepts
//!
//! - **Grant**: Expires on its own; its owner may revoke or extend it.
//! - **Registry**: The authoritative ledger, or a local fallback with the same contract.
//! - **Content store**: Immutable blobs keyed by content id.
//! - **Share handle**: `{origin}/shared/{grant id}`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sharevault::{ShareConfig, ShareService};
//! use sharevault::registry::MemoryRegistry;
//! use sharevault::store::MemoryContentStore;
//!
//! async fn example() {
//!     let service = ShareService::new(
//!         Arc::new(MemoryRegistry::new("0xA1")),
//!         Arc::new(MemoryContentStore::new()),
//!         ShareConfig::default(),
//!     );
//!
//!     // Share for one day behind a password
//!     let share = service
//!         .create_share(&serde_json::json!({"a": 1}), 86_400, Some("pw"))
//!         .await
//!         .unwrap();
//!     println!("send {}", share.url);
//!
//!     // Recipient side
//!     let content: serde_json::Value = service
//!         .consume_share(&share.id, Some("pw"))
//!         .await
//!         .unwrap();
//!     assert_eq!(content["a"], 1);
//! }
//! ```
//!
//! ## Security Notes
//!
//! The payload key is a single unsalted SHA-256 of the password. That keeps
//! the payload format compatible with existing shares but offers no work
//! factor against guessing. Choose long passwords.

pub mod config;
pub mod error;
pub mod handle;
pub mod service;

pub use config::{ShareConfig, ORIGIN_ENV};
pub use error::{ErrorKind, Result, ShareError};
pub use handle::ShareHandle;
pub use service::{Share, ShareService};

// Re-export the building blocks
pub use sharevault_core as core;
pub use sharevault_registry as registry;
pub use sharevault_store as store;

pub use sharevault_core::{AuditRecord, ContentId, GrantDetails, GrantId, Owner};
