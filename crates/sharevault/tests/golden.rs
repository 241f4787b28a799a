//! Golden test vectors for cross-implementation verification.
//!
//! The vectors themselves live in `sharevault_testkit::vectors`; this suite
//! checks them against the public surface of `sharevault`.
//!
//! The payload vectors were sealed with a fixed nonce by an independent
//! ChaCha20-Poly1305 implementation; `encrypt` itself always draws a
//! random nonce, so only decryption is pinned here.

use sharevault::core::{decrypt, ContentId, GrantId, PasswordDigest};
use sharevault_testkit::vectors::{
    cid_vectors, digest_vectors, payload_vectors, verify_all_vectors,
};

#[test]
fn test_all_vectors_match() {
    let results = verify_all_vectors();
    assert!(!results.is_empty());

    for (name, matches, actual) in results {
        assert!(matches, "vector '{}' produced {}", name, actual);
    }
}

#[test]
fn test_password_digests() {
    for v in digest_vectors() {
        let digest = PasswordDigest::of(v.password);
        assert_eq!(digest.to_hex(), v.digest, "password {:?}", v.password);
        assert!(digest.verify(v.password));
    }
}

#[test]
fn test_content_ids() {
    for v in cid_vectors() {
        let id = ContentId::for_bytes(v.content);
        assert_eq!(id.as_str(), v.cid, "vector {}", v.name);
        assert!(id.is_raw_sha256());
        assert_eq!(id.matches(v.content), Some(true));
    }
}

#[test]
fn test_fixed_nonce_payloads_decrypt() {
    for v in payload_vectors() {
        assert_eq!(decrypt(v.payload, v.password).unwrap(), v.plaintext, "vector {}", v.name);

        // Passwords differing only in case derive unrelated keys.
        let other = v.password.to_uppercase();
        assert!(decrypt(v.payload, &other).is_err(), "vector {}", v.name);
    }
}

#[test]
fn test_grant_id_text_form() {
    let id = GrantId::from_bytes([0x0f; 32]);
    let text = id.to_hex();

    assert_eq!(text.len(), GrantId::HEX_LEN);
    assert!(text.starts_with("0x"));
    assert_eq!(text, format!("0x{}", "0f".repeat(32)));
    assert_eq!(GrantId::from_hex(&text).unwrap(), id);
}
