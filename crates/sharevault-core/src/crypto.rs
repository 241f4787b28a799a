//! Hashing primitives: SHA-256 digests and content identifiers.
//!
//! SHA-256 is used for both password digests and content addressing so that
//! ids stay compatible with the CIDv1/IPFS ecosystem and with the ledger's
//! digest comparison.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;

use crate::error::CoreError;

/// A 32-byte SHA-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Hash(pub [u8; 32]);

impl Sha256Hash {
    /// Compute the SHA-256 hash of data.
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();
        Self(result.into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Convert to CIDv1 (raw codec, base32).
    ///
    /// Format: `b` + base32lower(0x01 || 0x55 || 0x12 || 0x20 || hash)
    pub fn to_raw_cid(&self) -> String {
        let mut cid_bytes = Vec::with_capacity(36);
        cid_bytes.push(0x01); // CIDv1
        cid_bytes.push(0x55); // raw codec
        cid_bytes.push(0x12); // sha2-256 multihash
        cid_bytes.push(0x20); // 32 bytes
        cid_bytes.extend_from_slice(&self.0);

        // Base32 lower with 'b' prefix (multibase)
        format!("b{}", base32_encode(&cid_bytes))
    }
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHA256({}...)", &self.to_hex()[..8])
    }
}

impl AsRef<[u8]> for Sha256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Sha256Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// One-way digest of a share password.
///
/// Registries store only this digest. Every registry implementation derives
/// it the same way so a grant verifies identically wherever it lives.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PasswordDigest(pub [u8; 32]);

impl PasswordDigest {
    /// Digest a plaintext password.
    pub fn of(password: &str) -> Self {
        Self(Sha256Hash::hash(password.as_bytes()).0)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string (optional `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| CoreError::InvalidDigest(s.len()))?;
        let len = bytes.len();
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CoreError::InvalidDigest(len))?;
        Ok(Self(arr))
    }

    /// Parse the ledger's wire form: 32 bytes, or empty for "no password".
    pub fn from_wire(bytes: &[u8]) -> Result<Option<Self>, CoreError> {
        match bytes.len() {
            0 => Ok(None),
            32 => {
                let mut arr = [0u8; 32];
                arr.copy_from_slice(bytes);
                Ok(Some(Self(arr)))
            }
            n => Err(CoreError::InvalidDigest(n)),
        }
    }

    /// Check a plaintext password against this digest.
    ///
    /// The comparison runs in constant time over the digest bytes.
    pub fn verify(&self, password: &str) -> bool {
        let candidate = Self::of(password);
        self.0.ct_eq(&candidate.0).into()
    }
}

// Digests are secrets-adjacent; never print them in full.
impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

impl Serialize for PasswordDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PasswordDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// RFC 4648 Base32 encoding (lowercase, no padding)
fn base32_encode(data: &[u8]) -> String {
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";
    let mut result = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer: u64 = 0;
    let mut bits_in_buffer = 0;

    for &byte in data {
        buffer = (buffer << 8) | (byte as u64);
        bits_in_buffer += 8;

        while bits_in_buffer >= 5 {
            bits_in_buffer -= 5;
            let index = ((buffer >> bits_in_buffer) & 0x1f) as usize;
            result.push(ALPHABET[index] as char);
        }
    }

    if bits_in_buffer > 0 {
        let index = ((buffer << (5 - bits_in_buffer)) & 0x1f) as usize;
        result.push(ALPHABET[index] as char);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hash() {
        let h1 = Sha256Hash::hash(b"test");
        let h2 = Sha256Hash::hash(b"test");
        assert_eq!(h1, h2);

        let h3 = Sha256Hash::hash(b"different");
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_password_digest_known_vector() {
        let digest = PasswordDigest::of("secret1");
        assert_eq!(
            digest.to_hex(),
            "5b11618c2e44027877d0cd0921ed166b9f176f50587fc91e7534dd2946db77d6"
        );
    }

    #[test]
    fn test_password_digest_verify() {
        let digest = PasswordDigest::of("secret1");
        assert!(digest.verify("secret1"));
        assert!(!digest.verify("wrong"));
        assert!(!digest.verify(""));
    }

    #[test]
    fn test_password_digest_wire_form() {
        assert_eq!(PasswordDigest::from_wire(&[]).unwrap(), None);

        let digest = PasswordDigest::of("pw");
        assert_eq!(
            PasswordDigest::from_wire(digest.as_bytes()).unwrap(),
            Some(digest)
        );

        assert!(PasswordDigest::from_wire(&[0u8; 5]).is_err());
    }

    #[test]
    fn test_password_digest_debug_is_redacted() {
        let digest = PasswordDigest::of("pw");
        assert_eq!(format!("{:?}", digest), "PasswordDigest(..)");
    }

    #[test]
    fn test_cid_format() {
        let cid = Sha256Hash::hash(b"hello").to_raw_cid();

        // CID should start with 'b' (base32 multibase prefix)
        assert!(cid.starts_with("bafkrei"));

        // CID should be lowercase
        assert_eq!(cid, cid.to_lowercase());
    }

    #[test]
    fn test_base32_encode() {
        // Test vector from RFC 4648
        assert_eq!(base32_encode(b""), "");
        assert_eq!(base32_encode(b"f"), "my");
        assert_eq!(base32_encode(b"fo"), "mzxq");
        assert_eq!(base32_encode(b"foo"), "mzxw6");
        assert_eq!(base32_encode(b"foob"), "mzxw6yq");
        assert_eq!(base32_encode(b"fooba"), "mzxw6ytb");
        assert_eq!(base32_encode(b"foobar"), "mzxw6ytboi");
    }
}
