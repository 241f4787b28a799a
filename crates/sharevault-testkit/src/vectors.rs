//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the password digest, content id and payload formats
//! so every implementation (and every backend) agrees on them.

use sharevault_core::{decrypt, ContentId, PasswordDigest};

/// Password digest vector.
#[derive(Debug, Clone)]
pub struct DigestVector {
    pub password: &'static str,
    /// Expected SHA-256 digest (hex).
    pub digest: &'static str,
}

/// Content id vector.
#[derive(Debug, Clone)]
pub struct CidVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub content: &'static [u8],
    /// Expected CIDv1 (raw, sha2-256, base32).
    pub cid: &'static str,
}

/// Payload vector, sealed with a fixed nonce.
#[derive(Debug, Clone)]
pub struct PayloadVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub password: &'static str,
    /// base64(nonce || ciphertext || tag)
    pub payload: &'static str,
    pub plaintext: &'static [u8],
}

/// Get all password digest vectors.
pub fn digest_vectors() -> Vec<DigestVector> {
    vec![
        DigestVector {
            password: "",
            digest: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
        DigestVector {
            password: "pw",
            digest: "30c952fab122c3f9759f02a6d95c3758b246b4fee239957b2d4fee46e26170c4",
        },
        DigestVector {
            password: "hunter2",
            digest: "f52fbd32b2b3b86ff88ef6c490628285f482af15ddcb29541f94bcf526a3f6c7",
        },
        DigestVector {
            password: "secret1",
            digest: "5b11618c2e44027877d0cd0921ed166b9f176f50587fc91e7534dd2946db77d6",
        },
    ]
}

/// Get all content id vectors.
pub fn cid_vectors() -> Vec<CidVector> {
    vec![
        CidVector {
            name: "empty blob",
            content: b"",
            cid: "bafkreihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku",
        },
        CidVector {
            name: "hello world",
            content: b"hello world",
            cid: "bafkreifzjut3te2nhyekklss27nh3k72ysco7y32koao5eei66wof36n5e",
        },
        CidVector {
            name: "compact json object",
            content: br#"{"a":1}"#,
            cid: "bafkreiablk6x6xgfpiw5ss3vsdyevwaiijzzaxxdh3c45pvomitwvf7ymi",
        },
    ]
}

/// Get all payload vectors.
pub fn payload_vectors() -> Vec<PayloadVector> {
    vec![
        PayloadVector {
            name: "json under pw, nonce 00..0b",
            password: "pw",
            payload: "AAECAwQFBgcICQoLrTh1hCbxUkE6h9KVZqFtEyWAgnChtH0=",
            plaintext: br#"{"a":1}"#,
        },
        PayloadVector {
            name: "text under secret1, nonce ff..ff",
            password: "secret1",
            payload: "////////////////b3UUSsGuIgSK9ifbldp1CRaUYZwni3+h232d",
            plaintext: b"hello world",
        },
    ]
}

/// Verify all golden vectors against this implementation.
///
/// Returns `(name, matches, actual)` for each vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let digests = digest_vectors().into_iter().map(|v| {
        let actual = PasswordDigest::of(v.password).to_hex();
        (format!("digest {:?}", v.password), actual == v.digest, actual)
    });

    let cids = cid_vectors().into_iter().map(|v| {
        let actual = ContentId::for_bytes(v.content).to_string();
        (format!("cid {}", v.name), actual == v.cid, actual)
    });

    let payloads = payload_vectors().into_iter().map(|v| match decrypt(v.payload, v.password) {
        Ok(plain) => (
            format!("payload {}", v.name),
            plain == v.plaintext,
            hex::encode(&plain),
        ),
        Err(e) => (format!("payload {}", v.name), false, e.to_string()),
    });

    digests.chain(cids).chain(payloads).collect()
}
