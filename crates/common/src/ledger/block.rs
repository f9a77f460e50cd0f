use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{fill_random, HashAlgorithm, SecretError, DIGEST_SIZE};

/// `previous_hash` of the first block in a chain
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";
/// Sequence id of the first block in a chain
pub const FIRST_SEQUENCE_ID: u64 = 1;
/// Random bytes drawn for each block nonce
pub const BLOCK_NONCE_SIZE: usize = 8;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("failed to draw block nonce: {0}")]
    Nonce(#[from] SecretError),
    #[error("no sequence id follows block {0}")]
    SequenceExhausted(u64),
}

/// One link of the integrity ledger
///
/// Blocks are immutable once created. `current_hash` commits to
/// `previous_hash ∥ payload_hash ∥ nonce ∥ timestamp` (SHA-256, hex), and
/// `previous_hash` commits to the prior block, so rewriting any block
/// in place is visible to [`verify_blocks`](super::verify_blocks).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub sequence_id: u64,
    pub previous_hash: String,
    pub payload_hash: String,
    pub nonce: String,
    pub current_hash: String,
    /// RFC 3339, UTC, microsecond precision. Kept as text so the hash is
    /// recomputed over exactly what was stored.
    pub timestamp: String,
}

/// SHA-256 over the concatenated block fields, lowercase hex
pub fn compute_hash(previous_hash: &str, payload_hash: &str, nonce: &str, timestamp: &str) -> String {
    let mut preimage =
        String::with_capacity(previous_hash.len() + payload_hash.len() + nonce.len() + timestamp.len());
    preimage.push_str(previous_hash);
    preimage.push_str(payload_hash);
    preimage.push_str(nonce);
    preimage.push_str(timestamp);
    HashAlgorithm::Sha256.digest(preimage.as_bytes())
}

/// Digest to record for an arbitrary ledger payload
///
/// A payload that already looks like a 256-bit hex digest is kept as is;
/// anything else is hashed with SHA-256 first.
pub fn payload_digest(payload: &str) -> String {
    let is_digest = payload.len() == DIGEST_SIZE * 2
        && payload
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if is_digest {
        payload.to_string()
    } else {
        HashAlgorithm::Sha256.digest(payload.as_bytes())
    }
}

impl Block {
    /// Build the block that follows `tail` (or the genesis block when `tail` is `None`)
    ///
    /// Draws a fresh nonce and captures the current time. This does not
    /// persist anything; providers call it inside their append critical section.
    pub fn next(tail: Option<&Block>, payload_hash: impl Into<String>) -> Result<Self, BlockError> {
        let (sequence_id, previous_hash) = match tail {
            Some(tail) => {
                let sequence_id = tail
                    .sequence_id
                    .checked_add(1)
                    .ok_or(BlockError::SequenceExhausted(tail.sequence_id))?;
                (sequence_id, tail.current_hash.clone())
            }
            None => (FIRST_SEQUENCE_ID, GENESIS_HASH.to_string()),
        };

        let mut nonce = [0u8; BLOCK_NONCE_SIZE];
        fill_random(&mut nonce)?;
        let nonce = hex::encode(nonce);
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let payload_hash = payload_hash.into();
        let current_hash = compute_hash(&previous_hash, &payload_hash, &nonce, &timestamp);

        Ok(Block {
            sequence_id,
            previous_hash,
            payload_hash,
            nonce,
            current_hash,
            timestamp,
        })
    }

    /// Recompute `current_hash` from the stored fields
    pub fn recompute_hash(&self) -> String {
        compute_hash(
            &self.previous_hash,
            &self.payload_hash,
            &self.nonce,
            &self.timestamp,
        )
    }

    pub fn is_genesis(&self) -> bool {
        self.sequence_id == FIRST_SEQUENCE_ID
    }

    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_genesis_block() {
        let block = Block::next(None, "abc").unwrap();
        assert_eq!(block.sequence_id, FIRST_SEQUENCE_ID);
        assert_eq!(block.previous_hash, GENESIS_HASH);
        assert_eq!(GENESIS_HASH.len(), 64);
        assert!(block.is_genesis());
        assert_eq!(block.nonce.len(), BLOCK_NONCE_SIZE * 2);
        assert_eq!(block.current_hash, block.recompute_hash());
    }

    #[test]
    fn test_next_links_to_tail() {
        let first = Block::next(None, "a").unwrap();
        let second = Block::next(Some(&first), "b").unwrap();

        assert_eq!(second.sequence_id, 2);
        assert_eq!(second.previous_hash, first.current_hash);
        assert!(!second.is_genesis());
    }

    #[test]
    fn test_next_after_last_sequence_id_is_an_error() {
        let mut tail = Block::next(None, "a").unwrap();
        tail.sequence_id = u64::MAX;

        let result = Block::next(Some(&tail), "b");
        assert_eq!(result, Err(BlockError::SequenceExhausted(u64::MAX)));
    }

    #[test]
    fn test_compute_hash_matches_concatenation() {
        let expected = HashAlgorithm::Sha256.digest(b"prevpayloadnoncets");
        assert_eq!(compute_hash("prev", "payload", "nonce", "ts"), expected);
    }

    #[test]
    fn test_nonce_makes_identical_payloads_distinct() {
        let a = Block::next(None, "same").unwrap();
        let b = Block::next(None, "same").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.current_hash, b.current_hash);
    }

    #[test]
    fn test_timestamp_format() {
        let block = Block::next(None, "x").unwrap();
        assert!(block.timestamp.ends_with('Z'));
        // seconds + '.' + 6 fractional digits
        let fraction = block.timestamp.rsplit('.').next().unwrap();
        assert_eq!(fraction.len(), "000000Z".len());
        assert!(block.timestamp_utc().is_some());
    }

    #[test]
    fn test_tampered_field_changes_hash() {
        let mut block = Block::next(None, "payload").unwrap();
        block.payload_hash = "other".to_string();
        assert_ne!(block.current_hash, block.recompute_hash());
    }

    #[test]
    fn test_payload_digest() {
        let digest = HashAlgorithm::Sha256.digest(b"hello");
        assert_eq!(payload_digest(&digest), digest);
        assert_eq!(payload_digest("hello"), digest);
        // uppercase hex is not a canonical digest, so it is hashed
        assert_ne!(payload_digest(&digest.to_uppercase()), digest.to_uppercase());
    }
}
