//! # Sharevault Store
//!
//! Content-addressed blob storage for sharevault. Provides a trait-based
//! interface so the share workflow is agnostic of where encrypted payloads
//! live.
//!
//! ## Key Types
//!
//! - [`ContentStore`] - The async trait for put/get by content id
//! - [`MemoryContentStore`] - In-memory storage for tests and demos
//! - [`SqliteContentStore`] - Local persistent storage
//! - [`GatewayContentStore`] - HTTP client for an IPFS-compatible node
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sharevault_store::{ContentStore, SqliteContentStore};
//!
//! async fn example() {
//!     let store = SqliteContentStore::open("blobs.db").unwrap();
//!
//!     let id = store.put(b"ciphertext").await.unwrap();
//!     let bytes = store.get(&id).await.unwrap();
//!     assert_eq!(bytes, b"ciphertext");
//!
//!     println!("{}", store.gateway_url(&id));
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Idempotent puts**: storing the same bytes twice yields the same id
//! - **Integrity**: ids computed locally are re-checked on remote reads

pub mod error;
pub mod gateway;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use gateway::{duration_secs, GatewayConfig, GatewayContentStore};
pub use memory::MemoryContentStore;
pub use migration::{migrate, Migration};
pub use sqlite::SqliteContentStore;
pub use traits::{gateway_link, ContentStore, DEFAULT_GATEWAY};
