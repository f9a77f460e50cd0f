//! Base64 text encoding for binary fields in JSON transport records

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(text.trim())
}

/// `#[serde(with = "...")]` helper for `Vec<u8>` fields
pub mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        super::decode(&text).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "...")]` helper for fixed-size nonce fields
pub mod base64_nonce {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::crypto::secret::NONCE_SIZE;

    pub fn serialize<S>(nonce: &[u8; NONCE_SIZE], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::encode(nonce))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; NONCE_SIZE], D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        let bytes = super::decode(&text).map_err(serde::de::Error::custom)?;
        if bytes.len() != NONCE_SIZE {
            return Err(serde::de::Error::invalid_length(
                bytes.len(),
                &format!("expected {} bytes", NONCE_SIZE).as_str(),
            ));
        }
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes);
        Ok(nonce)
    }
}
