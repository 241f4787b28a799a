//! ContentStore trait: the abstract interface for blob persistence.
//!
//! The share workflow only needs to put bytes and get them back by content
//! id. Implementations include an in-memory map, SQLite, and an HTTP client
//! for an IPFS-compatible node.

use async_trait::async_trait;
use sharevault_core::ContentId;

use crate::error::Result;

/// Public gateway used to build links when no other gateway is configured.
pub const DEFAULT_GATEWAY: &str = "https://ipfs.io";

/// The ContentStore trait: async interface for immutable blobs.
///
/// # Design Notes
///
/// - **Content addressed**: identical bytes always map to the same id.
/// - **Idempotent puts**: storing the same bytes twice is not an error and
///   does not create a second copy.
/// - **Immutable**: an id is never rebound to different bytes.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store a blob and return its content id.
    async fn put(&self, data: &[u8]) -> Result<ContentId>;

    /// Retrieve exactly the bytes stored under `id`.
    ///
    /// Fails with `NotFound` if the id is unknown, or `Unavailable` if the
    /// backing store cannot be reached.
    async fn get(&self, id: &ContentId) -> Result<Vec<u8>>;

    /// Check if a blob exists.
    async fn contains(&self, id: &ContentId) -> Result<bool>;

    /// Resolve an id to a fetchable URL for external tooling.
    ///
    /// Pure string formatting; never touches the network.
    fn gateway_url(&self, id: &ContentId) -> String;
}

/// Join a gateway base and a content id as `{base}/ipfs/{id}`.
pub fn gateway_link(base: &str, id: &ContentId) -> String {
    format!("{}/ipfs/{}", base.trim_end_matches('/'), id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_link_normalises_slash() {
        let id = ContentId::new("QmTest123");
        assert_eq!(
            gateway_link("https://gw.example/", &id),
            "https://gw.example/ipfs/QmTest123"
        );
        assert_eq!(
            gateway_link("https://gw.example", &id),
            "https://gw.example/ipfs/QmTest123"
        );
    }
}
