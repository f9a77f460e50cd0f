//! Key wrapping with ECIES (ephemeral ECDH + HKDF + AES-256-GCM)
//!
//! # Protocol Overview
//!
//! To wrap a content key for a recipient:
//! 1. **Generate ephemeral keypair**: a single-use P-256 key pair
//! 2. **Perform ECDH**: ephemeral secret x recipient public key
//! 3. **Derive**: HKDF-SHA256 over the shared x-coordinate, no salt, info `"ecies"`
//! 4. **Encrypt**: AES-256-GCM with a fresh 96-bit nonce and no associated data
//! 5. **Package**: a [`WrappedKey`] holding ciphertext, nonce and the ephemeral public key
//!
//! The recipient redoes the ECDH with their own secret key and the embedded
//! ephemeral public key, rederives the same key and decrypts. The ephemeral
//! secret is dropped as soon as the shared secret is computed, so nothing
//! that could reopen a past wrap is kept around.
//!
//! # Wire Format
//!
//! ```text
//! {
//!   "encrypted_key": "<base64>",
//!   "nonce": "<base64, 12 bytes>",
//!   "ephemeral_public_key": "-----BEGIN PUBLIC KEY-----\n..."
//! }
//! ```

use hkdf::Hkdf;
use p256::ecdh::{EphemeralSecret, SharedSecret};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use super::encoding::{base64_bytes, base64_nonce};
use super::keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE};
use super::secret::{self, ContentKey, SecretError, CONTENT_KEY_SIZE, NONCE_SIZE};

/// HKDF info label binding derived keys to this protocol
pub const ECIES_INFO: &[u8] = b"ecies";

/// Errors that can occur while wrapping or unwrapping a key
#[derive(Debug, thiserror::Error)]
pub enum WrapError {
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
    #[error("key derivation failed")]
    Kdf,
    #[error("invalid wrapped key encoding: {0}")]
    InvalidEncoding(String),
}

impl WrapError {
    /// True when the wrapped key failed to authenticate
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, WrapError::Secret(SecretError::DecryptionFailed))
    }
}

/// A 256-bit key encrypted for exactly one recipient
///
/// # Examples
///
/// ```ignore
/// // Alice wraps a fresh content key for Bob
/// let content_key = ContentKey::generate()?;
/// let wrapped = wrap_key(&content_key, &bob.public)?;
///
/// // Bob recovers it with his own secret key
/// let recovered = unwrap_key(&wrapped, &bob.secret)?;
/// assert_eq!(content_key, recovered);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey {
    #[serde(with = "base64_bytes")]
    pub encrypted_key: Vec<u8>,
    #[serde(with = "base64_nonce")]
    pub nonce: [u8; NONCE_SIZE],
    pub ephemeral_public_key: PublicKey,
}

impl WrappedKey {
    /// Encode as the JSON transport object
    pub fn to_json(&self) -> Result<String, WrapError> {
        serde_json::to_string(self).map_err(|e| WrapError::InvalidEncoding(e.to_string()))
    }

    /// Parse the JSON transport object
    ///
    /// # Errors
    ///
    /// Returns [`WrapError::InvalidEncoding`] for malformed JSON, bad base64,
    /// a nonce of the wrong length or an unparseable ephemeral key.
    pub fn from_json(json: &str) -> Result<Self, WrapError> {
        serde_json::from_str(json).map_err(|e| WrapError::InvalidEncoding(e.to_string()))
    }
}

fn derive_key(shared: &SharedSecret) -> Result<ContentKey, WrapError> {
    let hk = Hkdf::<Sha256>::new(None, shared.raw_secret_bytes());
    let mut okm = [0u8; CONTENT_KEY_SIZE];
    hk.expand(ECIES_INFO, &mut okm).map_err(|_| WrapError::Kdf)?;
    let key = ContentKey::from(okm);
    okm.zeroize();
    Ok(key)
}

fn wrap_bytes(key_bytes: &[u8], recipient: &PublicKey) -> Result<WrappedKey, WrapError> {
    let ephemeral = EphemeralSecret::random(&mut OsRng);
    let ephemeral_public_key = PublicKey::from(ephemeral.public_key());
    let shared = ephemeral.diffie_hellman(recipient.as_inner());
    drop(ephemeral);

    let kek = derive_key(&shared)?;
    let (nonce, encrypted_key) = secret::seal(&kek, key_bytes)?;

    Ok(WrappedKey {
        encrypted_key,
        nonce,
        ephemeral_public_key,
    })
}

fn unwrap_bytes(wrapped: &WrappedKey, recipient: &SecretKey) -> Result<Vec<u8>, WrapError> {
    let shared = p256::ecdh::diffie_hellman(
        recipient.as_inner().to_nonzero_scalar(),
        wrapped.ephemeral_public_key.as_inner().as_affine(),
    );
    let kek = derive_key(&shared)?;

    secret::open(&kek, &wrapped.nonce, &wrapped.encrypted_key).map_err(|e| {
        tracing::warn!(
            ephemeral = %wrapped.ephemeral_public_key.fingerprint(),
            "failed to unwrap key: {}",
            e
        );
        WrapError::from(e)
    })
}

/// Wrap `content_key` so only the holder of `recipient`'s secret key can read it
pub fn wrap_key(content_key: &ContentKey, recipient: &PublicKey) -> Result<WrappedKey, WrapError> {
    wrap_bytes(content_key.bytes(), recipient)
}

/// Recover a content key wrapped by [`wrap_key`]
///
/// # Errors
///
/// Returns [`SecretError::DecryptionFailed`] (wrapped in [`WrapError::Secret`])
/// if the ciphertext was tampered with or `recipient` is the wrong key.
pub fn unwrap_key(wrapped: &WrappedKey, recipient: &SecretKey) -> Result<ContentKey, WrapError> {
    let mut bytes = unwrap_bytes(wrapped, recipient)?;
    let key = ContentKey::from_slice(&bytes);
    bytes.zeroize();
    Ok(key?)
}

/// Wrap a private key (for example a group key) for `recipient`
pub fn wrap_secret_key(secret: &SecretKey, recipient: &PublicKey) -> Result<WrappedKey, WrapError> {
    wrap_bytes(&secret.to_bytes()[..], recipient)
}

/// Recover a private key wrapped by [`wrap_secret_key`]
pub fn unwrap_secret_key(wrapped: &WrappedKey, recipient: &SecretKey) -> Result<SecretKey, WrapError> {
    let mut bytes = unwrap_bytes(wrapped, recipient)?;
    let result = if bytes.len() == PRIVATE_KEY_SIZE {
        SecretKey::from_slice(&bytes).map_err(WrapError::from)
    } else {
        Err(SecretError::InvalidLength {
            expected: PRIVATE_KEY_SIZE,
            actual: bytes.len(),
        }
        .into())
    };
    bytes.zeroize();
    result
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::keys::{Curve, KeyPair};

    #[test]
    fn test_wrap_unwrap_roundtrip() {
        let bob = KeyPair::generate(Curve::P256);
        let content_key = ContentKey::generate().unwrap();

        let wrapped = wrap_key(&content_key, &bob.public).unwrap();
        let recovered = unwrap_key(&wrapped, &bob.secret).unwrap();

        assert_eq!(content_key, recovered);
    }

    #[test]
    fn test_ephemeral_key_is_fresh_per_wrap() {
        let bob = KeyPair::generate(Curve::P256);
        let content_key = ContentKey::generate().unwrap();

        let a = wrap_key(&content_key, &bob.public).unwrap();
        let b = wrap_key(&content_key, &bob.public).unwrap();

        assert_ne!(a.ephemeral_public_key, b.ephemeral_public_key);
        assert_ne!(a.encrypted_key, b.encrypted_key);
        assert_ne!(a.ephemeral_public_key, bob.public);
    }

    #[test]
    fn test_wrong_recipient_fails() {
        let bob = KeyPair::generate(Curve::P256);
        let eve = KeyPair::generate(Curve::P256);
        let wrapped = wrap_key(&ContentKey::generate().unwrap(), &bob.public).unwrap();

        let err = unwrap_key(&wrapped, &eve.secret).unwrap_err();
        assert!(err.is_decryption_failure());
    }

    #[test]
    fn test_tampered_wrap_fails() {
        let bob = KeyPair::generate(Curve::P256);
        let mut wrapped = wrap_key(&ContentKey::generate().unwrap(), &bob.public).unwrap();
        let last = wrapped.encrypted_key.len() - 1;
        wrapped.encrypted_key[last] ^= 0x01;

        assert!(unwrap_key(&wrapped, &bob.secret)
            .unwrap_err()
            .is_decryption_failure());
    }

    #[test]
    fn test_swapped_ephemeral_key_fails() {
        let bob = KeyPair::generate(Curve::P256);
        let mut wrapped = wrap_key(&ContentKey::generate().unwrap(), &bob.public).unwrap();
        wrapped.ephemeral_public_key = KeyPair::generate(Curve::P256).public;

        assert!(unwrap_key(&wrapped, &bob.secret)
            .unwrap_err()
            .is_decryption_failure());
    }

    #[test]
    fn test_json_transport_shape() {
        let bob = KeyPair::generate(Curve::P256);
        let content_key = ContentKey::generate().unwrap();
        let wrapped = wrap_key(&content_key, &bob.public).unwrap();

        let json = wrapped.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["encrypted_key"].is_string());
        assert!(value["nonce"].is_string());
        assert!(value["ephemeral_public_key"]
            .as_str()
            .unwrap()
            .starts_with("-----BEGIN PUBLIC KEY-----"));

        let parsed = WrappedKey::from_json(&json).unwrap();
        assert_eq!(parsed, wrapped);
        assert_eq!(unwrap_key(&parsed, &bob.secret).unwrap(), content_key);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            WrappedKey::from_json("{\"encrypted_key\": 1}"),
            Err(WrapError::InvalidEncoding(_))
        ));
        assert!(matches!(
            WrappedKey::from_json(
                "{\"encrypted_key\":\"AAAA\",\"nonce\":\"AAAA\",\"ephemeral_public_key\":\"x\"}"
            ),
            Err(WrapError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_wrap_secret_key_roundtrip() {
        let group = KeyPair::generate(Curve::P256);
        let member = KeyPair::generate(Curve::P256);

        let wrapped = wrap_secret_key(&group.secret, &member.public).unwrap();
        let recovered = unwrap_secret_key(&wrapped, &member.secret).unwrap();

        assert_eq!(recovered, group.secret);
        assert_eq!(recovered.public(), group.public);
    }

    #[test]
    fn test_unwrap_secret_key_rejects_wrong_length() {
        let member = KeyPair::generate(Curve::P256);
        let wrapped = wrap_bytes(&[1u8; 16], &member.public).unwrap();

        assert!(matches!(
            unwrap_secret_key(&wrapped, &member.secret),
            Err(WrapError::Secret(SecretError::InvalidLength { .. }))
        ));
    }
}
