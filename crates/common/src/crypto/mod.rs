//! Cryptographic primitives for Chainmail
//!
//! This module provides the cryptographic foundation for Chainmail's security model:
//!
//! - **Identity & Authentication**: P-256 keypairs, ECDSA/SHA-256 signatures
//! - **Encryption**: AES-256-GCM content encryption with a fresh key per message
//! - **Key Wrapping**: ECIES (ephemeral ECDH + HKDF-SHA256 + AES-256-GCM)
//! - **Digests**: SHA-256 and SHA3-256, hex encoded
//!
//! # Security Model
//!
//! ## Identity
//! Every user and every group owns a long-lived P-256 keypair. Public keys
//! travel as SubjectPublicKeyInfo PEM text; private keys as PKCS#8 PEM, and
//! only when a caller explicitly asks for them.
//!
//! ## Content Encryption
//! Each message is sealed under its own random 256-bit [`ContentKey`]. The key
//! is never derived from a passphrase and never reused.
//!
//! ## Key Wrapping
//! To address a content key to a recipient:
//! 1. Generate an ephemeral P-256 keypair
//! 2. ECDH between the ephemeral secret and the recipient's public key
//! 3. HKDF-SHA256 (info `"ecies"`) to derive a key-encryption key
//! 4. AES-256-GCM the content key under it
//! 5. Package as a [`WrappedKey`] (ciphertext, nonce, ephemeral public key)
//!
//! Group private keys are wrapped the same way, once per member.

mod encoding;
mod hash;
mod keys;
mod secret;
mod signature;
mod wrapped_key;

pub use encoding::{decode as base64_decode, encode as base64_encode};
pub use hash::{digest, digest_named, HashAlgorithm, HashError, DIGEST_SIZE};
pub use keys::{Curve, KeyError, KeyPair, PublicKey, SecretKey, PRIVATE_KEY_SIZE};
pub(crate) use secret::fill_random;
pub use secret::{
    decrypt, encrypt, ContentKey, EncryptedEnvelope, SecretError, CONTENT_KEY_SIZE, NONCE_SIZE,
};
pub use signature::{sign, verify, verify_strict, Signature, SignatureError, Verification};
pub use wrapped_key::{
    unwrap_key, unwrap_secret_key, wrap_key, wrap_secret_key, WrapError, WrappedKey, ECIES_INFO,
};
