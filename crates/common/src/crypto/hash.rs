//! Message digests with a selectable algorithm
//!
//! Two 256-bit algorithms are supported: SHA-256 (the general-purpose hash,
//! also used for ledger block hashes) and SHA3-256 (Keccak sponge). Digests
//! are returned as lowercase hex so they can be stored and compared as text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::{Digest, Sha3_256};

/// Size of every supported digest in bytes
pub const DIGEST_SIZE: usize = 32;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// Hash algorithm selectable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha3_256,
}

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha3_256 => "sha3_256",
        }
    }

    /// Raw digest bytes of `message`
    pub fn digest_bytes(&self, message: &[u8]) -> [u8; DIGEST_SIZE] {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(message).into(),
            HashAlgorithm::Sha3_256 => Sha3_256::digest(message).into(),
        }
    }

    /// Lowercase hex digest of `message`
    pub fn digest(&self, message: &[u8]) -> String {
        hex::encode(self.digest_bytes(message))
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            "sha3_256" | "sha3-256" => Ok(HashAlgorithm::Sha3_256),
            _ => Err(HashError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Hex digest of `message` with the given algorithm
pub fn digest(message: &[u8], algorithm: HashAlgorithm) -> String {
    algorithm.digest(message)
}

/// Hex digest of `message` with an algorithm selected by name
///
/// # Errors
///
/// Returns [`HashError::UnsupportedAlgorithm`] for names other than
/// `sha256` / `sha3_256` (and their dashed aliases).
pub fn digest_named(message: &[u8], algorithm: &str) -> Result<String, HashError> {
    let algorithm = HashAlgorithm::from_str(algorithm)?;
    Ok(algorithm.digest(message))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            digest(b"hello", HashAlgorithm::Sha256),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_sha3_256_known_vector() {
        // NIST SHA3-256("abc")
        assert_eq!(
            digest(b"abc", HashAlgorithm::Sha3_256),
            "3a985da74fe225b2045c172d6bd390bd855f086e3e9d525b46bfe24511431532"
        );
    }

    #[test]
    fn test_algorithms_differ() {
        let a = digest(b"hello", HashAlgorithm::Sha256);
        let b = digest(b"hello", HashAlgorithm::Sha3_256);
        assert_ne!(a, b);
        assert_eq!(a.len(), DIGEST_SIZE * 2);
        assert_eq!(b.len(), DIGEST_SIZE * 2);
    }

    #[test]
    fn test_digest_named() {
        assert_eq!(
            digest_named(b"hello", "SHA256").unwrap(),
            digest(b"hello", HashAlgorithm::Sha256)
        );
        assert_eq!(
            digest_named(b"hello", "sha3-256").unwrap(),
            digest(b"hello", HashAlgorithm::Sha3_256)
        );
    }

    #[test]
    fn test_unsupported_algorithm() {
        let result = digest_named(b"hello", "md5");
        assert_eq!(
            result,
            Err(HashError::UnsupportedAlgorithm("md5".to_string()))
        );
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&HashAlgorithm::Sha3_256).unwrap();
        assert_eq!(json, "\"sha3_256\"");
        let parsed: HashAlgorithm = serde_json::from_str("\"sha256\"").unwrap();
        assert_eq!(parsed, HashAlgorithm::Sha256);
    }
}
