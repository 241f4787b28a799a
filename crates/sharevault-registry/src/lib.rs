//! # Sharevault Registry
//!
//! Access grants: who may read which content, until when, and with what
//! password.
//!
//! ## Overview
//!
//! A grant is created by an owner for one content id and a duration. Anyone
//! holding the grant id (and the password, if one was set) may verify it to
//! learn the content id; each successful verification is counted. The owner
//! may revoke the grant or push its expiry forward.
//!
//! ## Implementations
//!
//! - [`LedgerRegistry`] - HTTP client of the authoritative ledger
//! - [`SqliteRegistry`] - Local persistent fallback
//! - [`MemoryRegistry`] - In-memory fallback for tests and demos
//!
//! All three share the [`Registry`] trait, the [`RegistryError`] taxonomy
//! and the lifecycle rules in `sharevault_core::grant`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sharevault_registry::{
//!     select_registry, LedgerConfig, LedgerRegistry, Registry, SqliteRegistry,
//! };
//!
//! async fn example() {
//!     let ledger = LedgerRegistry::new(LedgerConfig::new("https://ledger.example", "0xA1")).unwrap();
//!     let local = SqliteRegistry::open("grants.db", "0xA1").unwrap();
//!
//!     let selected = select_registry(Arc::new(ledger), Arc::new(local)).await;
//!     println!("using {}", selected.source);
//! }
//! ```

pub mod error;
pub mod ledger;
pub mod memory;
pub mod select;
pub mod sqlite;
pub mod traits;

pub use error::{RegistryError, Result};
pub use ledger::{LedgerConfig, LedgerEvent, LedgerRegistry, TransactionReceipt, CALLER_HEADER};
pub use memory::MemoryRegistry;
pub use select::{select_registry, RegistrySource, SelectedRegistry};
pub use sqlite::{SqliteRegistry, REGISTRY_MIGRATIONS};
pub use traits::Registry;
