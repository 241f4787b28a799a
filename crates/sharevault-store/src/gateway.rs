//! HTTP implementation of the ContentStore trait.
//!
//! Talks to an IPFS-compatible node: uploads go through the node's RPC API
//! (`/api/v0/add`), reads go through its path gateway (`/ipfs/{cid}`).
//! Uploads request CIDv1 with raw leaves, so for single-block blobs the
//! node returns the same id [`ContentId::for_bytes`] computes locally.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Deserializer};
use sharevault_core::ContentId;
use url::Url;

use crate::error::{Result, StoreError};
use crate::traits::{gateway_link, ContentStore, DEFAULT_GATEWAY};

/// Default request timeout for node calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for [`GatewayContentStore`].
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL of the node RPC API (e.g. `http://127.0.0.1:5001`).
    pub api_url: String,

    /// Base URL of the read gateway (e.g. `https://ipfs.io`).
    pub gateway_url: String,

    /// Per-request timeout, in seconds when loaded from JSON.
    #[serde(deserialize_with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:5001".to_string(),
            gateway_url: DEFAULT_GATEWAY.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    /// Create a config with the given API and gateway bases.
    pub fn new(api_url: impl Into<String>, gateway_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            gateway_url: gateway_url.into(),
            ..Default::default()
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Deserialize a [`Duration`] from a whole number of seconds.
pub fn duration_secs<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_secs)
}

/// Response of `/api/v0/add`.
#[derive(Debug, Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

/// Content store backed by an IPFS-compatible node over HTTP.
#[derive(Clone, Debug)]
pub struct GatewayContentStore {
    client: Client,
    api: String,
    gateway: String,
}

impl GatewayContentStore {
    /// Build a store from config. Fails if either base URL does not parse.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        Url::parse(&config.api_url)?;
        Url::parse(&config.gateway_url)?;

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api: config.api_url.trim_end_matches('/').to_string(),
            gateway: config.gateway_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Map a non-success HTTP status onto the store taxonomy.
///
/// `lookup` names the content a read asked for. Only reads turn a 404 into
/// `NotFound`; on upload a 404 means the API endpoint itself is wrong.
async fn check_status(response: Response, lookup: Option<&str>) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if let (StatusCode::NOT_FOUND, Some(id)) = (status, lookup) {
        return Err(StoreError::NotFound(id.to_string()));
    }

    let message = response.text().await.unwrap_or_default();
    if status.is_server_error() {
        Err(StoreError::Unavailable(format!("{}: {}", status, message)))
    } else {
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ContentStore for GatewayContentStore {
    async fn put(&self, data: &[u8]) -> Result<ContentId> {
        let expected = ContentId::for_bytes(data);
        let url = format!("{}/api/v0/add", self.api);

        let part = Part::bytes(data.to_vec()).file_name("blob");
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .query(&[("cid-version", "1"), ("raw-leaves", "true")])
            .multipart(form)
            .send()
            .await?;
        let response = check_status(response, None).await?;

        let added: AddResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let id = ContentId::new(added.hash);

        // A raw sha2-256 id that differs from ours means the node stored other bytes.
        if id.is_raw_sha256() && id != expected {
            return Err(StoreError::Integrity(id.to_string()));
        }

        tracing::debug!(content_id = %id, size = data.len(), "uploaded blob to node");
        Ok(id)
    }

    async fn get(&self, id: &ContentId) -> Result<Vec<u8>> {
        let url = gateway_link(&self.gateway, id);

        let response = self.client.get(&url).send().await?;
        let response = check_status(response, Some(id.as_str())).await?;
        let data = response.bytes().await?.to_vec();

        if id.matches(&data) == Some(false) {
            tracing::warn!(content_id = %id, "gateway returned bytes that do not match id");
            return Err(StoreError::Integrity(id.to_string()));
        }

        tracing::debug!(content_id = %id, size = data.len(), "fetched blob from gateway");
        Ok(data)
    }

    async fn contains(&self, id: &ContentId) -> Result<bool> {
        let url = gateway_link(&self.gateway, id);

        let response = self.client.head(&url).send().await?;
        match check_status(response, Some(id.as_str())).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn gateway_url(&self, id: &ContentId) -> String {
        gateway_link(&self.gateway, id)
    }
}
