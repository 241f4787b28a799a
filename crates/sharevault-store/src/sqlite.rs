//! SQLite implementation of the ContentStore trait.
//!
//! Local persistent blob storage for offline use. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use sharevault_core::ContentId;

use crate::error::{Result, StoreError};
use crate::migration::{self, now_secs, CONTENT_MIGRATIONS};
use crate::traits::{gateway_link, ContentStore, DEFAULT_GATEWAY};

/// SQLite-based content store.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteContentStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
    gateway: String,
}

impl SqliteContentStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        migration::migrate(&mut conn, CONTENT_MIGRATIONS)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            gateway: DEFAULT_GATEWAY.to_string(),
        })
    }

    /// Use a different gateway base for [`ContentStore::gateway_url`].
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = gateway.into();
        self
    }

    /// Run a blocking operation on the connection off the async runtime.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Unavailable(format!("mutex poisoned: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("spawn_blocking failed: {}", e)))?
    }
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn put(&self, data: &[u8]) -> Result<ContentId> {
        let id = ContentId::for_bytes(data);
        let data = data.to_vec();
        let key = id.clone();

        let inserted = self
            .with_conn(move |conn| {
                let changed = conn.execute(
                    "INSERT OR IGNORE INTO blobs (content_id, data, size, stored_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![key.as_str(), data, data.len() as i64, now_secs()],
                )?;
                Ok(changed > 0)
            })
            .await?;

        tracing::debug!(content_id = %id, inserted, "stored blob");
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> Result<Vec<u8>> {
        let key = id.clone();

        let data: Option<Vec<u8>> = self
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT data FROM blobs WHERE content_id = ?1",
                    params![key.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::from)
            })
            .await?;

        data.ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn contains(&self, id: &ContentId) -> Result<bool> {
        let key = id.clone();

        self.with_conn(move |conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM blobs WHERE content_id = ?1",
                    params![key.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    fn gateway_url(&self, id: &ContentId) -> String {
        gateway_link(&self.gateway, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = SqliteContentStore::open_memory().unwrap();
        let id = store.put(br#"{"a":1}"#).await.unwrap();

        assert_eq!(
            id.as_str(),
            "bafkreiablk6x6xgfpiw5ss3vsdyevwaiijzzaxxdh3c45pvomitwvf7ymi"
        );
        assert_eq!(store.get(&id).await.unwrap(), br#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_put_idempotent() {
        let store = SqliteContentStore::open_memory().unwrap();

        let a = store.put(b"twice").await.unwrap();
        let b = store.put(b"twice").await.unwrap();
        assert_eq!(a, b);

        let count: i64 = store
            .with_conn(|conn| {
                conn.query_row("SELECT COUNT(*) FROM blobs", [], |row| row.get(0))
                    .map_err(StoreError::from)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = SqliteContentStore::open_memory().unwrap();
        let id = ContentId::for_bytes(b"never stored");

        assert!(!store.contains(&id).await.unwrap());
        assert!(matches!(
            store.get(&id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blobs.db");

        let id = {
            let store = SqliteContentStore::open(&path).unwrap();
            store.put(b"durable").await.unwrap()
        };

        let reopened = SqliteContentStore::open(&path).unwrap();
        assert_eq!(reopened.get(&id).await.unwrap(), b"durable");
    }

    #[tokio::test]
    async fn test_binary_roundtrip_is_exact() {
        let store = SqliteContentStore::open_memory().unwrap();
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

        let id = store.put(&data).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap(), data);
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(32))]

        #[test]
        fn prop_backends_agree_on_ids(data in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..2048)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (from_sqlite, from_memory) = rt.block_on(async {
                let sqlite = SqliteContentStore::open_memory().unwrap();
                let memory = crate::MemoryContentStore::new();
                (sqlite.put(&data).await.unwrap(), memory.put(&data).await.unwrap())
            });

            proptest::prop_assert_eq!(&from_sqlite, &from_memory);
            proptest::prop_assert!(from_sqlite.is_raw_sha256());
            proptest::prop_assert_eq!(from_sqlite.matches(&data), Some(true));
        }
    }
}
