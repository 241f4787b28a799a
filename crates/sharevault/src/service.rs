//! The share workflow: ties grant verification to content retrieval.
//!
//! Creating a share serializes the content, encrypts it when a password is
//! given, stores it, and registers a grant for the resulting content id.
//! Consuming a share asks the registry first (the authoritative check),
//! then fetches and decrypts.
//!
//! The workflow awaits each step in turn and never retries. Dropping a
//! returned future cancels whatever request is in flight; HTTP backends
//! bound each request with their configured timeout.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sharevault_core::{
    decrypt_bytes, encrypt, AuditRecord, ContentId, GrantDetails, GrantId, PasswordDigest,
};
use sharevault_registry::{Registry, RegistryError};
use sharevault_store::ContentStore;

use crate::config::ShareConfig;
use crate::error::{Result, ShareError};
use crate::handle::ShareHandle;

/// A created share.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    pub id: GrantId,
    pub content_id: ContentId,
    pub url: ShareHandle,
}

/// The main share service.
///
/// Provides a unified API for:
/// - Creating shares from serializable content or raw bytes
/// - Consuming shares with an optional password
/// - Owner actions: revoke, extend, list
pub struct ShareService<R: Registry + ?Sized, C: ContentStore + ?Sized> {
    /// The grant registry.
    registry: Arc<R>,
    /// The content store.
    store: Arc<C>,
    /// Configuration.
    config: ShareConfig,
}

impl<R: Registry + ?Sized, C: ContentStore + ?Sized> ShareService<R, C> {
    /// Create a new service from injected clients.
    pub fn new(registry: Arc<R>, store: Arc<C>, config: ShareConfig) -> Self {
        Self {
            registry,
            store,
            config,
        }
    }

    /// Get the registry reference.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Get the content store reference.
    pub fn store(&self) -> &C {
        &self.store
    }

    /// Get the configuration.
    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sharing
    // ─────────────────────────────────────────────────────────────────────────

    /// Share serializable content as JSON.
    pub async fn create_share<T: Serialize + ?Sized>(
        &self,
        content: &T,
        duration_seconds: u64,
        password: Option<&str>,
    ) -> Result<Share> {
        let bytes = serde_json::to_vec(content)?;
        self.create_share_bytes(&bytes, duration_seconds, password)
            .await
    }

    /// Share raw bytes.
    ///
    /// An empty password counts as no password.
    pub async fn create_share_bytes(
        &self,
        content: &[u8],
        duration_seconds: u64,
        password: Option<&str>,
    ) -> Result<Share> {
        // Checked before upload so a doomed share leaves no blob behind.
        if duration_seconds == 0 {
            return Err(RegistryError::InvalidDuration.into());
        }

        let password = password.filter(|p| !p.is_empty());

        let stored = match password {
            Some(pw) => encrypt(content, pw)?.into_bytes(),
            None => content.to_vec(),
        };

        let content_id = self.store.put(&stored).await?;
        let digest = password.map(PasswordDigest::of);

        let id = self
            .registry
            .create_access_grant(&content_id, duration_seconds, digest)
            .await?;

        tracing::info!(
            grant = %id,
            content_id = %content_id,
            duration_seconds,
            protected = password.is_some(),
            "created share"
        );

        Ok(Share {
            id,
            content_id,
            url: ShareHandle::new(&self.config.origin, id),
        })
    }

    /// Consume a share and deserialize its JSON content.
    pub async fn consume_share<T: DeserializeOwned>(
        &self,
        id: &GrantId,
        password: Option<&str>,
    ) -> Result<T> {
        let bytes = self.consume_share_bytes(id, password).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Consume a share and return its raw bytes.
    ///
    /// Registry errors are returned exactly as the registry reported them.
    pub async fn consume_share_bytes(
        &self,
        id: &GrantId,
        password: Option<&str>,
    ) -> Result<Vec<u8>> {
        let password = password.unwrap_or("");

        // Advisory only: a failed read falls through to verification.
        let preflight = if self.config.preflight_details {
            match self.registry.get_access_grant_details(id).await {
                Ok(details) => {
                    tracing::debug!(
                        grant = %id,
                        has_password = details.has_password,
                        expiry_time = details.expiry_time,
                        "share preflight"
                    );
                    Some(details)
                }
                Err(e) => {
                    tracing::warn!(grant = %id, error = %e, "share preflight failed");
                    None
                }
            }
        } else {
            None
        };

        let content_id = self.registry.verify_access(id, password).await?;

        let has_password = match preflight {
            Some(details) => details.has_password,
            None => self.registry.get_access_grant_details(id).await?.has_password,
        };

        let bytes = self.store.get(&content_id).await?;

        let content = if has_password {
            decrypt_bytes(&bytes, password).map_err(|_| ShareError::DecryptionFailure)?
        } else {
            bytes
        };

        tracing::info!(grant = %id, content_id = %content_id, "consumed share");
        Ok(content)
    }

    /// Consume a share given its URL.
    pub async fn consume_handle<T: DeserializeOwned>(
        &self,
        url: &str,
        password: Option<&str>,
    ) -> Result<T> {
        let handle = ShareHandle::parse(url)?;
        self.consume_share(&handle.id(), password).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Inspection and owner actions
    // ─────────────────────────────────────────────────────────────────────────

    /// Public details of a share, for showing expiry and password hints.
    pub async fn share_info(&self, id: &GrantId) -> Result<GrantDetails> {
        Ok(self.registry.get_access_grant_details(id).await?)
    }

    /// Revoke a share. Only its owner may do this.
    pub async fn revoke_share(&self, id: &GrantId) -> Result<()> {
        self.registry.revoke(id).await?;
        tracing::info!(grant = %id, "revoked share");
        Ok(())
    }

    /// Move a share's expiry forward. Only its owner may do this.
    pub async fn extend_share(&self, id: &GrantId, new_expiry: i64) -> Result<()> {
        self.registry.extend(id, new_expiry).await?;
        tracing::info!(grant = %id, new_expiry, "extended share");
        Ok(())
    }

    /// Audit record of a share.
    pub async fn audit(&self, id: &GrantId) -> Result<AuditRecord> {
        Ok(self.registry.audit_record(id).await?)
    }

    /// Audit records of every share created by this service's caller.
    pub async fn my_shares(&self) -> Result<Vec<AuditRecord>> {
        let owner = self.registry.caller().clone();
        Ok(self.registry.grants_by_owner(&owner).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde::Deserialize;
    use sharevault_core::ManualClock;
    use sharevault_registry::MemoryRegistry;
    use sharevault_store::MemoryContentStore;

    const T0: i64 = 1_700_000_000;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        title: String,
        body: String,
    }

    fn note() -> Note {
        Note {
            title: "labs".to_string(),
            body: "all normal".to_string(),
        }
    }

    fn service(
        config: ShareConfig,
    ) -> (
        ShareService<MemoryRegistry, MemoryContentStore>,
        ManualClock,
    ) {
        let clock = ManualClock::new(T0);
        let registry = MemoryRegistry::with_clock("0xOwner", Arc::new(clock.clone()));
        let service = ShareService::new(
            Arc::new(registry),
            Arc::new(MemoryContentStore::new()),
            config,
        );
        (service, clock)
    }

    #[tokio::test]
    async fn test_protected_roundtrip() {
        let (svc, _) = service(ShareConfig::default());
        let share = svc.create_share(&note(), 3600, Some("pw")).await.unwrap();

        let back: Note = svc.consume_share(&share.id, Some("pw")).await.unwrap();
        assert_eq!(back, note());

        // The stored blob is ciphertext, not the JSON.
        let stored = svc.store().get(&share.content_id).await.unwrap();
        assert!(serde_json::from_slice::<Note>(&stored).is_err());
    }

    #[tokio::test]
    async fn test_open_roundtrip_stores_plain_json() {
        let (svc, _) = service(ShareConfig::default());
        let share = svc.create_share(&note(), 3600, None).await.unwrap();

        let stored = svc.store().get(&share.content_id).await.unwrap();
        assert_eq!(stored, serde_json::to_vec(&note()).unwrap());

        let back: Note = svc.consume_share(&share.id, Some("ignored")).await.unwrap();
        assert_eq!(back, note());
    }

    #[tokio::test]
    async fn test_empty_password_means_unprotected() {
        let (svc, _) = service(ShareConfig::default());
        let share = svc.create_share(&note(), 60, Some("")).await.unwrap();

        assert!(!svc.share_info(&share.id).await.unwrap().has_password);
        let back: Note = svc.consume_share(&share.id, None).await.unwrap();
        assert_eq!(back, note());
    }

    #[tokio::test]
    async fn test_wrong_password_is_registry_error() {
        let (svc, _) = service(ShareConfig::default());
        let share = svc.create_share(&note(), 60, Some("pw")).await.unwrap();

        let err = svc
            .consume_share::<Note>(&share.id, Some("nope"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ShareError::Registry(RegistryError::InvalidPassword(_))
        ));
        assert_eq!(svc.audit(&share.id).await.unwrap().access_count, 0);
    }

    #[tokio::test]
    async fn test_expired_share() {
        let (svc, clock) = service(ShareConfig::default().with_preflight(false));
        let share = svc.create_share(&note(), 60, Some("pw")).await.unwrap();

        clock.advance(61);
        let err = svc
            .consume_share::<Note>(&share.id, Some("pw"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Expired);
    }

    #[tokio::test]
    async fn test_zero_duration_uploads_nothing() {
        let (svc, _) = service(ShareConfig::default());
        let err = svc.create_share(&note(), 0, None).await.unwrap_err();

        assert!(matches!(
            err,
            ShareError::Registry(RegistryError::InvalidDuration)
        ));
        assert!(svc.store().is_empty());
    }

    #[tokio::test]
    async fn test_share_url_uses_origin() {
        let config = ShareConfig::default().with_origin("https://share.example/");
        let (svc, _) = service(config);
        let share = svc.create_share(&note(), 60, None).await.unwrap();

        assert_eq!(
            share.url.to_string(),
            format!("https://share.example/shared/{}", share.id)
        );

        let back: Note = svc
            .consume_handle(&share.url.to_string(), None)
            .await
            .unwrap();
        assert_eq!(back, note());
    }

    #[tokio::test]
    async fn test_corrupted_ciphertext_is_decryption_failure() {
        let (svc, _) = service(ShareConfig::default());
        let share = svc.create_share(&note(), 60, Some("pw")).await.unwrap();

        svc.store().corrupt(&share.content_id, b"bm90IGEgcGF5bG9hZA==".to_vec());

        let err = svc
            .consume_share::<Note>(&share.id, Some("pw"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecryptionFailure);
    }

    #[tokio::test]
    async fn test_owner_actions() {
        let (svc, _) = service(ShareConfig::default());
        let a = svc.create_share(&note(), 60, None).await.unwrap();
        let b = svc.create_share(&note(), 120, Some("pw")).await.unwrap();

        svc.extend_share(&a.id, T0 + 600).await.unwrap();
        svc.revoke_share(&b.id).await.unwrap();

        let mine = svc.my_shares().await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].expiry_time, T0 + 600);
        assert!(!mine[1].is_active);
    }

    /// Delegates to a memory registry, failing the first `n` details reads.
    struct LaggingDetails {
        inner: MemoryRegistry,
        failures: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Registry for LaggingDetails {
        fn caller(&self) -> &sharevault_core::Owner {
            self.inner.caller()
        }

        async fn create_access_grant(
            &self,
            content_id: &ContentId,
            duration_seconds: u64,
            password_digest: Option<PasswordDigest>,
        ) -> sharevault_registry::Result<GrantId> {
            self.inner
                .create_access_grant(content_id, duration_seconds, password_digest)
                .await
        }

        async fn verify_access(
            &self,
            id: &GrantId,
            password: &str,
        ) -> sharevault_registry::Result<ContentId> {
            self.inner.verify_access(id, password).await
        }

        async fn revoke(&self, id: &GrantId) -> sharevault_registry::Result<()> {
            self.inner.revoke(id).await
        }

        async fn extend(&self, id: &GrantId, new_expiry: i64) -> sharevault_registry::Result<()> {
            self.inner.extend(id, new_expiry).await
        }

        async fn get_access_grant_details(
            &self,
            id: &GrantId,
        ) -> sharevault_registry::Result<GrantDetails> {
            use std::sync::atomic::Ordering;
            let lagging = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if lagging {
                return Err(RegistryError::Unavailable("read replica behind".into()));
            }
            self.inner.get_access_grant_details(id).await
        }

        async fn audit_record(&self, id: &GrantId) -> sharevault_registry::Result<AuditRecord> {
            self.inner.audit_record(id).await
        }

        async fn grants_by_owner(
            &self,
            owner: &sharevault_core::Owner,
        ) -> sharevault_registry::Result<Vec<AuditRecord>> {
            self.inner.grants_by_owner(owner).await
        }

        async fn ping(&self) -> sharevault_registry::Result<()> {
            self.inner.ping().await
        }
    }

    #[tokio::test]
    async fn test_failed_preflight_falls_through_to_verify() {
        let registry = Arc::new(LaggingDetails {
            inner: MemoryRegistry::new("0xOwner"),
            failures: std::sync::atomic::AtomicUsize::new(0),
        });
        let svc = ShareService::new(
            registry.clone(),
            Arc::new(MemoryContentStore::new()),
            ShareConfig::default(),
        );
        let share = svc.create_share(&note(), 60, Some("pw")).await.unwrap();

        // Only the advisory read fails; the post-verify read succeeds.
        registry
            .failures
            .store(1, std::sync::atomic::Ordering::SeqCst);
        let back: Note = svc.consume_share(&share.id, Some("pw")).await.unwrap();
        assert_eq!(back, note());
        assert_eq!(svc.audit(&share.id).await.unwrap().access_count, 1);
    }

    #[tokio::test]
    async fn test_failed_preflight_keeps_verify_verdict() {
        let registry = Arc::new(LaggingDetails {
            inner: MemoryRegistry::new("0xOwner"),
            failures: std::sync::atomic::AtomicUsize::new(0),
        });
        let svc = ShareService::new(
            registry.clone(),
            Arc::new(MemoryContentStore::new()),
            ShareConfig::default(),
        );
        let share = svc.create_share(&note(), 60, Some("pw")).await.unwrap();

        registry
            .failures
            .store(1, std::sync::atomic::Ordering::SeqCst);
        let err = svc
            .consume_share::<Note>(&share.id, Some("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPassword);
    }
}
