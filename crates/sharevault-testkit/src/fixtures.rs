//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::Path;
use std::sync::Arc;

use sharevault::{ShareConfig, ShareService};
use sharevault_core::{Clock, ManualClock, Owner};
use sharevault_registry::{MemoryRegistry, Registry, SqliteRegistry};
use sharevault_store::{MemoryContentStore, SqliteContentStore};

/// Service type wired to in-memory backends.
pub type MemoryShareService = ShareService<MemoryRegistry, MemoryContentStore>;

/// Service type wired to SQLite backends.
pub type SqliteShareService = ShareService<SqliteRegistry, SqliteContentStore>;

/// Start time of every fixture clock.
pub const FIXTURE_START: i64 = 1_700_000_000;

/// An owner's share service on in-memory backends, with a manual clock.
///
/// Recipients created with [`ShareFixture::recipient`] see the same grants
/// and blobs and follow the same clock.
pub struct ShareFixture {
    pub clock: ManualClock,
    pub registry: MemoryRegistry,
    pub store: Arc<MemoryContentStore>,
    pub service: MemoryShareService,
}

impl ShareFixture {
    /// Create a fixture owned by `0xOwner`.
    pub fn new() -> Self {
        Self::with_owner("0xOwner")
    }

    /// Create a fixture owned by `owner`.
    pub fn with_owner(owner: &str) -> Self {
        let clock = ManualClock::new(FIXTURE_START);
        let registry = MemoryRegistry::with_clock(owner, Arc::new(clock.clone()));
        let store = Arc::new(MemoryContentStore::new());
        let service = ShareService::new(
            Arc::new(registry.clone()),
            store.clone(),
            ShareConfig::default(),
        );

        Self {
            clock,
            registry,
            store,
            service,
        }
    }

    /// The owner identity.
    pub fn owner(&self) -> Owner {
        self.registry.caller().clone()
    }

    /// A service for another party over the same backends.
    pub fn recipient(&self, who: &str) -> MemoryShareService {
        ShareService::new(
            Arc::new(self.registry.connect_as(who)),
            self.store.clone(),
            ShareConfig::default(),
        )
    }

    /// Current fixture time.
    pub fn now(&self) -> i64 {
        self.clock.now()
    }

    /// Move the fixture clock forward.
    pub fn advance(&self, seconds: i64) {
        self.clock.advance(seconds);
    }
}

impl Default for ShareFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create recipient services `0xParty0`, `0xParty1`, ... for multi-party tests.
pub fn multi_party_services(fixture: &ShareFixture, count: usize) -> Vec<MemoryShareService> {
    (0..count)
        .map(|i| fixture.recipient(&format!("0xParty{}", i)))
        .collect()
}

/// A share service on SQLite files under `dir`, acting as `owner`.
pub fn sqlite_service(dir: &Path, owner: &str) -> SqliteShareService {
    let registry = SqliteRegistry::open(dir.join("grants.db"), owner)
        .unwrap_or_else(|e| panic!("open grants.db: {}", e));
    let store = SqliteContentStore::open(dir.join("blobs.db"))
        .unwrap_or_else(|e| panic!("open blobs.db: {}", e));
    ShareService::new(Arc::new(registry), Arc::new(store), ShareConfig::default())
}

/// Install a test-friendly tracing subscriber, honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use sharevault::ErrorKind;

    #[tokio::test]
    async fn test_recipient_sees_owner_share() {
        init_tracing();
        let fixture = ShareFixture::new();
        let share = fixture
            .service
            .create_share(&json!({"k": "v"}), 60, Some("pw"))
            .await
            .unwrap();

        let bob = fixture.recipient("0xBob");
        let got: Value = bob.consume_share(&share.id, Some("pw")).await.unwrap();
        assert_eq!(got, json!({"k": "v"}));
        assert_eq!(fixture.owner(), Owner::new("0xOwner"));
    }

    #[tokio::test]
    async fn test_clock_is_shared() {
        let fixture = ShareFixture::new();
        let share = fixture
            .service
            .create_share(&json!(1), 60, None)
            .await
            .unwrap();

        fixture.advance(61);
        assert_eq!(fixture.now(), FIXTURE_START + 61);

        let err = fixture
            .recipient("0xBob")
            .consume_share::<Value>(&share.id, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Expired);
    }

    #[tokio::test]
    async fn test_multi_party() {
        let fixture = ShareFixture::new();
        let share = fixture
            .service
            .create_share(&json!("hi"), 60, None)
            .await
            .unwrap();

        for party in multi_party_services(&fixture, 3) {
            let got: Value = party.consume_share(&share.id, None).await.unwrap();
            assert_eq!(got, json!("hi"));
        }
        assert_eq!(
            fixture.service.audit(&share.id).await.unwrap().access_count,
            3
        );
    }

    #[tokio::test]
    async fn test_sqlite_service() {
        let dir = tempfile::tempdir().unwrap();
        let service = sqlite_service(dir.path(), "0xOwner");

        let share = service.create_share(&json!([1, 2]), 60, None).await.unwrap();
        let got: Value = service.consume_share(&share.id, None).await.unwrap();
        assert_eq!(got, json!([1, 2]));
    }
}
