//! Share handles: the URLs handed to recipients.
//!
//! A handle has the form `{origin}/shared/{id}` where `id` is the grant id
//! in `0x`-prefixed hex.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use sharevault_core::GrantId;

use crate::error::{Result, ShareError};

const SHARED_SEGMENT: &str = "/shared/";

/// A shareable URL embedding a grant id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareHandle {
    origin: String,
    id: GrantId,
}

impl ShareHandle {
    /// Build a handle under `origin`. A trailing `/` on the origin is dropped.
    pub fn new(origin: &str, id: GrantId) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            id,
        }
    }

    /// Parse a handle URL.
    ///
    /// Query strings, fragments and a trailing `/` after the id are ignored.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        let (origin, rest) = url
            .rsplit_once(SHARED_SEGMENT)
            .ok_or_else(|| ShareError::InvalidHandle(url.to_string()))?;

        let raw = rest
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');

        let id = GrantId::from_hex(raw).map_err(|_| ShareError::InvalidHandle(url.to_string()))?;
        Ok(Self::new(origin, id))
    }

    /// The grant id.
    pub fn id(&self) -> GrantId {
        self.id
    }

    /// The origin, without trailing slash.
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl fmt::Display for ShareHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.origin, SHARED_SEGMENT, self.id.to_hex())
    }
}

impl FromStr for ShareHandle {
    type Err = ShareError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ShareHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> GrantId {
        GrantId::from_bytes([0xab; 32])
    }

    #[test]
    fn test_format() {
        let handle = ShareHandle::new("https://app.example/", id());
        assert_eq!(
            handle.to_string(),
            format!("https://app.example/shared/0x{}", "ab".repeat(32))
        );
    }

    #[test]
    fn test_parse_roundtrip() {
        let handle = ShareHandle::new("https://app.example", id());
        let parsed = ShareHandle::parse(&handle.to_string()).unwrap();
        assert_eq!(parsed, handle);
        assert_eq!(parsed.id(), id());
    }

    #[test]
    fn test_parse_ignores_query_and_trailing_slash() {
        let url = format!("http://localhost:3000/shared/0x{}/?ref=mail#top", "ab".repeat(32));
        let parsed: ShareHandle = url.parse().unwrap();
        assert_eq!(parsed.id(), id());
        assert_eq!(parsed.origin(), "http://localhost:3000");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ShareHandle::parse("https://app.example/other/0x12").is_err());
        assert!(ShareHandle::parse("https://app.example/shared/0x12").is_err());
        assert!(ShareHandle::parse("").is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let handle = ShareHandle::new("https://app.example", id());
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, format!("\"{}\"", handle));
    }
}
