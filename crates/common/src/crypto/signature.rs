//! ECDSA P-256 / SHA-256 signatures
//!
//! Signatures are DER-encoded and travel as hex text. `verify` collapses
//! every failure (bad encoding, wrong key, altered message) into `false` so a
//! caller can always tell "invalid" apart from a crash; `verify_strict` is the
//! `Result` flavour for call sites that want `?`.

use std::fmt;

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use super::keys::{PublicKey, SecretKey};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature is invalid for this key and message")]
    SignatureInvalid,
    #[error("invalid signature encoding: {0}")]
    InvalidEncoding(String),
}

/// Outcome of a signature or digest check
///
/// Kept as data rather than an error so callers must look at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verification {
    Valid,
    Invalid,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid)
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verification::Valid => f.write_str("valid"),
            Verification::Invalid => f.write_str("invalid"),
        }
    }
}

impl From<bool> for Verification {
    fn from(ok: bool) -> Self {
        if ok {
            Verification::Valid
        } else {
            Verification::Invalid
        }
    }
}

/// A detached DER-encoded ECDSA signature
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Signature(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse a signature from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, SignatureError> {
        let hex = hex.trim();
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        hex::decode(hex)
            .map(Signature)
            .map_err(|e| SignatureError::InvalidEncoding(format!("hex decode error: {}", e)))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    fn to_ecdsa(&self) -> Result<EcdsaSignature, SignatureError> {
        EcdsaSignature::from_der(&self.0)
            .or_else(|_| EcdsaSignature::from_slice(&self.0))
            .map_err(|e| SignatureError::InvalidEncoding(e.to_string()))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex = String::deserialize(deserializer)?;
        Signature::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// Sign `message` with ECDSA over SHA-256
///
/// The signing key lives only for the duration of this call.
pub fn sign(secret: &SecretKey, message: &[u8]) -> Signature {
    let signing_key = SigningKey::from(secret.as_inner());
    let signature: EcdsaSignature = signing_key.sign(message);
    Signature(signature.to_der().as_bytes().to_vec())
}

/// Check `signature` over `message` against `public`
///
/// Returns `false` for any failure, including an undecodable signature.
pub fn verify(public: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    match verify_strict(public, message, signature) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(key = %public.fingerprint(), "signature rejected: {}", e);
            false
        }
    }
}

/// Like [`verify`], but reports why verification failed
pub fn verify_strict(
    public: &PublicKey,
    message: &[u8],
    signature: &Signature,
) -> Result<(), SignatureError> {
    let signature = signature.to_ecdsa()?;
    let verifying_key = VerifyingKey::from(public.as_inner());
    verifying_key
        .verify(message, &signature)
        .map_err(|_| SignatureError::SignatureInvalid)
}
