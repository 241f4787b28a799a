//! HTTP client for the authoritative grant ledger.
//!
//! The ledger gateway exposes the grant contract as JSON over HTTP. State
//! changing calls are transactions; creation answers with a transaction
//! receipt whose `AccessGrantCreated` event carries the new grant id.
//!
//! Writes may take a moment to become visible to reads from other callers.
//! Callers should tolerate that and not expect read-your-writes across
//! registry instances.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sharevault_core::{AuditRecord, ContentId, GrantDetails, GrantId, Owner, PasswordDigest};
use sharevault_store::duration_secs;
use url::Url;

use crate::error::{RegistryError, Result};
use crate::traits::Registry;

/// Header carrying the caller identity on every request.
pub const CALLER_HEADER: &str = "x-sharevault-caller";

/// Event emitted by the ledger when a grant is created.
pub const GRANT_CREATED_EVENT: &str = "AccessGrantCreated";

/// Connection settings for [`LedgerRegistry`].
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Base URL of the ledger gateway.
    pub base_url: String,

    /// Identity the client acts as.
    pub caller: String,

    /// Per-request timeout, in seconds when loaded from JSON.
    #[serde(deserialize_with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8787".to_string(),
            caller: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl LedgerConfig {
    /// Create a config for `base_url`, acting as `caller`.
    pub fn new(base_url: impl Into<String>, caller: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            caller: caller.into(),
            ..Default::default()
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Receipt of a state-changing ledger transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub events: Vec<LedgerEvent>,
}

/// One event emitted by a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub event: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

impl TransactionReceipt {
    /// Id of the grant created by this transaction.
    pub fn created_grant_id(&self) -> Result<GrantId> {
        let event = self
            .events
            .iter()
            .find(|e| e.event == GRANT_CREATED_EVENT)
            .ok_or_else(|| {
                RegistryError::Protocol(format!(
                    "transaction {} has no {} event",
                    self.transaction_hash, GRANT_CREATED_EVENT
                ))
            })?;

        let raw = event
            .args
            .get("grantId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| RegistryError::Protocol("event is missing grantId".to_string()))?;

        GrantId::from_hex(raw).map_err(|e| RegistryError::Protocol(e.to_string()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateGrantRequest<'a> {
    content_id: &'a ContentId,
    duration_seconds: u64,
    password_digest: Option<&'a PasswordDigest>,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    content_id: ContentId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtendRequest {
    new_expiry: i64,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    message: String,
}

/// Registry backed by the remote ledger.
#[derive(Clone, Debug)]
pub struct LedgerRegistry {
    client: Client,
    base: Url,
    caller: Owner,
}

impl LedgerRegistry {
    /// Build a client from config. No request is made until first use.
    pub fn new(config: LedgerConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| RegistryError::Protocol(format!("invalid ledger url: {}", e)))?;
        if base.cannot_be_a_base() {
            return Err(RegistryError::Protocol(format!(
                "invalid ledger url: {}",
                config.base_url
            )));
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base,
            caller: Owner::new(config.caller),
        })
    }

    /// Build the URL for a path under the ledger base.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                RegistryError::Protocol(format!("ledger url cannot be a base: {}", self.base))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Send a request as the caller and map failures onto the grant taxonomy.
    ///
    /// `id` names the grant the request concerns; it is attached to errors
    /// decoded from the ledger's response.
    async fn send(&self, request: RequestBuilder, id: GrantId) -> Result<Response> {
        let response = request
            .header(CALLER_HEADER, self.caller.as_str())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "ledger request failed");
                RegistryError::from(e)
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status.is_server_error() {
            return Err(RegistryError::Unavailable(format!(
                "ledger returned {}",
                status
            )));
        }

        let text = response.text().await.unwrap_or_default();
        if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
            if let Some(err) = RegistryError::from_code(&body.error, id) {
                tracing::debug!(grant = %id, code = err.code(), "ledger refused request");
                return Err(err);
            }
            return Err(RegistryError::Protocol(format!(
                "{}: {} {}",
                status, body.error, body.message
            )));
        }

        if status == StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(id));
        }
        Err(RegistryError::Protocol(format!("{}: {}", status, text)))
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
        response
            .json()
            .await
            .map_err(|e| RegistryError::Protocol(format!("unexpected ledger response: {}", e)))
    }
}

#[async_trait]
impl Registry for LedgerRegistry {
    fn caller(&self) -> &Owner {
        &self.caller
    }

    async fn create_access_grant(
        &self,
        content_id: &ContentId,
        duration_seconds: u64,
        password_digest: Option<PasswordDigest>,
    ) -> Result<GrantId> {
        if duration_seconds == 0 {
            return Err(RegistryError::InvalidDuration);
        }

        let url = self.endpoint(&["grants"])?;
        let body = CreateGrantRequest {
            content_id,
            duration_seconds,
            password_digest: password_digest.as_ref(),
        };

        let response = self
            .send(self.client.post(url).json(&body), GrantId::ZERO)
            .await?;
        let receipt: TransactionReceipt = Self::json(response).await?;
        let id = receipt.created_grant_id()?;

        tracing::info!(
            grant = %id,
            tx = %receipt.transaction_hash,
            duration_seconds,
            "created grant on ledger"
        );
        Ok(id)
    }

    async fn verify_access(&self, id: &GrantId, password: &str) -> Result<ContentId> {
        let url = self.endpoint(&["grants", &id.to_hex(), "verify"])?;
        let response = self
            .send(
                self.client.post(url).json(&VerifyRequest { password }),
                *id,
            )
            .await?;

        let verified: VerifyResponse = Self::json(response).await?;
        Ok(verified.content_id)
    }

    async fn revoke(&self, id: &GrantId) -> Result<()> {
        let url = self.endpoint(&["grants", &id.to_hex(), "revoke"])?;
        self.send(self.client.post(url), *id).await?;

        tracing::info!(grant = %id, "revoked grant on ledger");
        Ok(())
    }

    async fn extend(&self, id: &GrantId, new_expiry: i64) -> Result<()> {
        let url = self.endpoint(&["grants", &id.to_hex(), "extend"])?;
        self.send(
            self.client.post(url).json(&ExtendRequest { new_expiry }),
            *id,
        )
        .await?;

        tracing::info!(grant = %id, new_expiry, "extended grant on ledger");
        Ok(())
    }

    async fn get_access_grant_details(&self, id: &GrantId) -> Result<GrantDetails> {
        let url = self.endpoint(&["grants", &id.to_hex()])?;
        let response = self.send(self.client.get(url), *id).await?;
        Self::json(response).await
    }

    async fn audit_record(&self, id: &GrantId) -> Result<AuditRecord> {
        let url = self.endpoint(&["grants", &id.to_hex(), "audit"])?;
        let response = self.send(self.client.get(url), *id).await?;
        Self::json(response).await
    }

    async fn grants_by_owner(&self, owner: &Owner) -> Result<Vec<AuditRecord>> {
        let url = self.endpoint(&["owners", owner.as_str(), "grants"])?;
        let response = self.send(self.client.get(url), GrantId::ZERO).await?;
        Self::json(response).await
    }

    async fn ping(&self) -> Result<()> {
        let url = self.endpoint(&["health"])?;
        self.send(self.client.get(url), GrantId::ZERO).await?;
        Ok(())
    }
}
