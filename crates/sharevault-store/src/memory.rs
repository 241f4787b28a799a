//! In-memory implementation of the ContentStore trait.
//!
//! This is primarily for testing and offline demos. It has the same
//! semantics as the other stores but keeps everything in memory with no
//! persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sharevault_core::ContentId;

use crate::error::{Result, StoreError};
use crate::traits::{gateway_link, ContentStore, DEFAULT_GATEWAY};

/// In-memory content store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryContentStore {
    blobs: RwLock<HashMap<ContentId, Vec<u8>>>,
    gateway: String,
}

impl MemoryContentStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            gateway: DEFAULT_GATEWAY.to_string(),
        }
    }

    /// Use a different gateway base for [`ContentStore::gateway_url`].
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = gateway.into();
        self
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Overwrite the bytes behind an id, bypassing content addressing.
    ///
    /// Only useful for simulating corruption in tests.
    pub fn corrupt(&self, id: &ContentId, data: Vec<u8>) {
        if let Ok(mut blobs) = self.blobs.write() {
            blobs.insert(id.clone(), data);
        }
    }
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Unavailable(format!("lock poisoned: {}", e))
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, data: &[u8]) -> Result<ContentId> {
        let id = ContentId::for_bytes(data);
        let mut blobs = self.blobs.write().map_err(poisoned)?;

        // Ids are content derived; an existing entry already holds these bytes.
        blobs.entry(id.clone()).or_insert_with(|| data.to_vec());

        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> Result<Vec<u8>> {
        let blobs = self.blobs.read().map_err(poisoned)?;
        blobs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn contains(&self, id: &ContentId) -> Result<bool> {
        let blobs = self.blobs.read().map_err(poisoned)?;
        Ok(blobs.contains_key(id))
    }

    fn gateway_url(&self, id: &ContentId) -> String {
        gateway_link(&self.gateway, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryContentStore::new();
        let id = store.put(b"hello world").await.unwrap();

        assert_eq!(
            id.as_str(),
            "bafkreifzjut3te2nhyekklss27nh3k72ysco7y32koao5eei66wof36n5e"
        );
        assert_eq!(store.get(&id).await.unwrap(), b"hello world");
        assert!(store.contains(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_idempotent() {
        let store = MemoryContentStore::new();

        let a = store.put(b"same").await.unwrap();
        let b = store.put(b"same").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_not_found() {
        let store = MemoryContentStore::new();
        let err = store.get(&ContentId::new("QmMissing")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_gateway_url() {
        let store = MemoryContentStore::new().with_gateway("http://localhost:8080");
        assert_eq!(
            store.gateway_url(&ContentId::new("QmTest123")),
            "http://localhost:8080/ipfs/QmTest123"
        );
    }
}
