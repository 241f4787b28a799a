//! Password-based payload encryption.
//!
//! Payloads are sealed with ChaCha20-Poly1305 under a key derived from the
//! share password. The stored form is
//!
//! ```text
//! base64( nonce (12 bytes) || ciphertext || tag (16 bytes) )
//! ```
//!
//! A fresh random nonce is drawn for every call; nonces are never cached or
//! counter-generated.
//!
//! The key is a single unsalted SHA-256 of the password. Whether this should
//! become a salted, iterated KDF (with the salt stored next to the nonce) is
//! an open question; changing it changes the payload format.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::crypto::Sha256Hash;
use crate::error::{CoreError, Result};

/// Size of the nonce in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Size of the derived key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// A 256-bit key derived from a password. Wiped on drop.
struct PasswordKey(Zeroizing<[u8; KEY_LEN]>);

impl PasswordKey {
    fn derive(password: &str) -> Self {
        Self(Zeroizing::new(Sha256Hash::hash(password.as_bytes()).0))
    }

    fn cipher(&self) -> ChaCha20Poly1305 {
        ChaCha20Poly1305::new(Key::from_slice(&self.0[..]))
    }
}

fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Encrypt `plaintext` under `password`.
///
/// Returns the base64 text of `nonce || ciphertext-with-tag`.
pub fn encrypt(plaintext: &[u8], password: &str) -> Result<String> {
    let key = PasswordKey::derive(password);
    let nonce = generate_nonce();

    let ciphertext = key
        .cipher()
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| CoreError::EncryptionFailure)?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);

    Ok(STANDARD.encode(sealed))
}

/// Decrypt a payload produced by [`encrypt`].
///
/// Any failure (malformed base64, short input, wrong password, tampered
/// bytes) is reported as [`CoreError::DecryptionFailure`]. Callers cannot
/// tell these causes apart, and neither can an attacker.
pub fn decrypt(payload: &str, password: &str) -> Result<Vec<u8>> {
    let sealed = STANDARD
        .decode(payload.trim())
        .map_err(|_| CoreError::DecryptionFailure)?;

    if sealed.len() < NONCE_LEN + TAG_LEN {
        return Err(CoreError::DecryptionFailure);
    }

    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    let key = PasswordKey::derive(password);

    key.cipher()
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CoreError::DecryptionFailure)
}

/// Decrypt a payload held as raw bytes (as returned by a content store).
pub fn decrypt_bytes(payload: &[u8], password: &str) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(payload).map_err(|_| CoreError::DecryptionFailure)?;
    decrypt(text, password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encrypt_decrypt() {
        let plaintext = b"hello, world!";
        let payload = encrypt(plaintext, "pw").unwrap();

        let decrypted = decrypt(&payload, "pw").unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_payload_layout() {
        let payload = encrypt(b"abc", "pw").unwrap();
        let raw = STANDARD.decode(&payload).unwrap();
        assert_eq!(raw.len(), NONCE_LEN + 3 + TAG_LEN);
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let a = encrypt(b"same input", "pw").unwrap();
        let b = encrypt(b"same input", "pw").unwrap();
        assert_ne!(a, b);

        let na = &STANDARD.decode(&a).unwrap()[..NONCE_LEN];
        let nb = &STANDARD.decode(&b).unwrap()[..NONCE_LEN];
        assert_ne!(na, nb);
    }

    #[test]
    fn test_wrong_password_fails() {
        let payload = encrypt(b"secret", "pw").unwrap();
        assert!(matches!(
            decrypt(&payload, "not-pw"),
            Err(CoreError::DecryptionFailure)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails_identically() {
        let payload = encrypt(b"secret", "pw").unwrap();
        let mut raw = STANDARD.decode(&payload).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = STANDARD.encode(raw);

        let wrong_pw = decrypt(&payload, "other").unwrap_err();
        let bad_tag = decrypt(&tampered, "pw").unwrap_err();
        assert_eq!(wrong_pw.to_string(), bad_tag.to_string());
    }

    #[test]
    fn test_garbage_input_fails() {
        assert!(decrypt("not base64 at all!", "pw").is_err());
        assert!(decrypt("", "pw").is_err());
        assert!(decrypt(&STANDARD.encode([0u8; 10]), "pw").is_err());
        assert!(decrypt_bytes(&[0xff, 0xfe], "pw").is_err());
    }

    #[test]
    fn test_empty_plaintext() {
        let payload = encrypt(b"", "pw").unwrap();
        assert_eq!(decrypt(&payload, "pw").unwrap(), b"");
    }

    proptest! {
        #[test]
        fn prop_roundtrip(plaintext in prop::collection::vec(any::<u8>(), 0..512), password in ".{0,32}") {
            let payload = encrypt(&plaintext, &password).unwrap();
            prop_assert_eq!(decrypt(&payload, &password).unwrap(), plaintext);
        }

        #[test]
        fn prop_wrong_password_rejected(
            plaintext in prop::collection::vec(any::<u8>(), 0..256),
            password in "[a-z0-9]{1,16}",
            wrong in "[a-z0-9]{1,16}",
        ) {
            prop_assume!(password != wrong);
            let payload = encrypt(&plaintext, &password).unwrap();
            prop_assert!(matches!(decrypt(&payload, &wrong), Err(CoreError::DecryptionFailure)));
        }
    }
}
