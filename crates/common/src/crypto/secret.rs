//! Content encryption using AES-256-GCM
//!
//! Every message gets its own freshly generated [`ContentKey`]. A key is never
//! derived from a passphrase and never reused across messages; each call to
//! [`encrypt`] draws a fresh random 96-bit nonce, and no associated data is
//! bound.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::encoding::{self, base64_bytes, base64_nonce};

/// Size of an AES-GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of an AES-256 key in bytes
pub const CONTENT_KEY_SIZE: usize = 32;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SecretError {
    #[error("encryption failed")]
    EncryptionFailed,
    /// Authentication tag mismatch: tampered ciphertext, wrong key or wrong nonce
    #[error("decryption failed: ciphertext could not be authenticated")]
    DecryptionFailed,
    #[error("invalid length, expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("system random source failed: {0}")]
    Random(String),
}

/// Fill `buf` from the operating system's secure random source
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<(), SecretError> {
    getrandom::getrandom(buf).map_err(|e| SecretError::Random(e.to_string()))
}

/// A 256-bit symmetric key for one message
///
/// Zeroed on drop. Never logged: `Debug` is redacted.
///
/// # Examples
///
/// ```ignore
/// let key = ContentKey::generate()?;
/// let envelope = encrypt(b"hello", &key)?;
/// assert_eq!(decrypt(&envelope, &key)?, b"hello");
/// ```
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ContentKey([u8; CONTENT_KEY_SIZE]);

impl ContentKey {
    /// Generate a new random key from the system's secure random source
    pub fn generate() -> Result<Self, SecretError> {
        let mut buff = [0u8; CONTENT_KEY_SIZE];
        fill_random(&mut buff)?;
        Ok(ContentKey(buff))
    }

    /// Create a key from a byte slice
    ///
    /// # Errors
    ///
    /// Returns [`SecretError::InvalidLength`] unless the slice is exactly
    /// [`CONTENT_KEY_SIZE`] bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != CONTENT_KEY_SIZE {
            return Err(SecretError::InvalidLength {
                expected: CONTENT_KEY_SIZE,
                actual: data.len(),
            });
        }
        let mut buff = [0u8; CONTENT_KEY_SIZE];
        buff.copy_from_slice(data);
        Ok(ContentKey(buff))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        encoding::encode(&self.0)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl From<[u8; CONTENT_KEY_SIZE]> for ContentKey {
    fn from(bytes: [u8; CONTENT_KEY_SIZE]) -> Self {
        ContentKey(bytes)
    }
}

impl fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContentKey(<redacted>)")
    }
}

/// Ciphertext plus the nonce it was sealed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    #[serde(with = "base64_bytes")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "base64_nonce")]
    pub nonce: [u8; NONCE_SIZE],
}

/// Seal `plaintext` under `key` with a fresh random nonce
pub(crate) fn seal(
    key: &ContentKey,
    plaintext: &[u8],
) -> Result<([u8; NONCE_SIZE], Vec<u8>), SecretError> {
    let mut nonce = [0u8; NONCE_SIZE];
    fill_random(&mut nonce)?;
    let ciphertext = key
        .cipher()
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| SecretError::EncryptionFailed)?;
    Ok((nonce, ciphertext))
}

pub(crate) fn open(
    key: &ContentKey,
    nonce: &[u8; NONCE_SIZE],
    ciphertext: &[u8],
) -> Result<Vec<u8>, SecretError> {
    key.cipher()
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| SecretError::DecryptionFailed)
}

/// Encrypt `message` under `key` with a fresh random nonce
pub fn encrypt(message: &[u8], key: &ContentKey) -> Result<EncryptedEnvelope, SecretError> {
    let (nonce, ciphertext) = seal(key, message)?;
    Ok(EncryptedEnvelope { ciphertext, nonce })
}

/// Decrypt an envelope produced by [`encrypt`]
///
/// # Errors
///
/// Returns [`SecretError::DecryptionFailed`] when the tag does not
/// authenticate. No plaintext is returned in that case.
pub fn decrypt(envelope: &EncryptedEnvelope, key: &ContentKey) -> Result<Vec<u8>, SecretError> {
    open(key, &envelope.nonce, &envelope.ciphertext)
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = ContentKey::generate().unwrap();
        let plaintext = b"Hello, World! This is a test message.";

        let envelope = encrypt(plaintext, &key).unwrap();
        assert_ne!(envelope.ciphertext.as_slice(), plaintext.as_slice());

        let decrypted = decrypt(&envelope, &key).unwrap();
        assert_eq!(plaintext.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_empty_message_roundtrip() {
        let key = ContentKey::generate().unwrap();
        let envelope = encrypt(b"", &key).unwrap();
        // tag only
        assert_eq!(envelope.ciphertext.len(), 16);
        assert_eq!(decrypt(&envelope, &key).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = ContentKey::generate().unwrap();
        let other = ContentKey::generate().unwrap();
        let envelope = encrypt(b"secret", &key).unwrap();

        assert_eq!(decrypt(&envelope, &other), Err(SecretError::DecryptionFailed));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = ContentKey::generate().unwrap();
        let mut envelope = encrypt(b"secret", &key).unwrap();
        envelope.ciphertext[0] ^= 0xff;

        assert_eq!(decrypt(&envelope, &key), Err(SecretError::DecryptionFailed));
    }

    #[test]
    fn test_tampered_nonce_fails() {
        let key = ContentKey::generate().unwrap();
        let mut envelope = encrypt(b"secret", &key).unwrap();
        envelope.nonce[0] ^= 0x01;

        assert_eq!(decrypt(&envelope, &key), Err(SecretError::DecryptionFailed));
    }

    #[test]
    fn test_nonces_are_fresh() {
        let key = ContentKey::generate().unwrap();
        let nonces: HashSet<[u8; NONCE_SIZE]> = (0..1000)
            .map(|_| encrypt(b"same", &key).unwrap().nonce)
            .collect();
        assert_eq!(nonces.len(), 1000);
    }

    #[test]
    fn test_content_key_from_slice() {
        let key = ContentKey::from_slice(&[7u8; CONTENT_KEY_SIZE]).unwrap();
        assert_eq!(key.bytes(), &[7u8; CONTENT_KEY_SIZE]);

        assert_eq!(
            ContentKey::from_slice(&[0u8; 16]),
            Err(SecretError::InvalidLength {
                expected: 32,
                actual: 16
            })
        );
    }

    #[test]
    fn test_content_key_debug_redacted() {
        let key = ContentKey::from([0xabu8; CONTENT_KEY_SIZE]);
        let debug = format!("{:?}", key);
        assert!(!debug.contains("ab"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_envelope_json_shape() {
        let key = ContentKey::generate().unwrap();
        let envelope = encrypt(b"hello", &key).unwrap();

        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json["ciphertext"].is_string());
        assert!(json["nonce"].is_string());

        let parsed: EncryptedEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, envelope);
    }
}
