//! Chain verification and message-integrity audits
//!
//! Nothing here stops at the first problem: every check runs to completion
//! and each problem is recorded, so an operator gets the full tamper report.

use serde::{Deserialize, Serialize};

use super::block::{Block, FIRST_SEQUENCE_ID, GENESIS_HASH};
use crate::crypto::{HashAlgorithm, Verification};

/// A single detected break in the hash chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainViolation {
    /// Block's `previous_hash` does not match its predecessor's `current_hash`
    /// (or the genesis sentinel for the first block)
    PreviousHashMismatch {
        sequence_id: u64,
        expected: String,
        found: String,
    },
    /// Stored `current_hash` does not match the recomputed digest of the block's fields
    CurrentHashMismatch {
        sequence_id: u64,
        stored: String,
        recomputed: String,
    },
    /// Sequence ids are not consecutive starting at 1
    SequenceGap { expected: u64, found: u64 },
    /// Block follows one that already carried the largest sequence id
    SequenceOverflow { sequence_id: u64 },
}

impl ChainViolation {
    pub fn sequence_id(&self) -> u64 {
        match self {
            ChainViolation::PreviousHashMismatch { sequence_id, .. } => *sequence_id,
            ChainViolation::CurrentHashMismatch { sequence_id, .. } => *sequence_id,
            ChainViolation::SequenceGap { found, .. } => *found,
            ChainViolation::SequenceOverflow { sequence_id } => *sequence_id,
        }
    }
}

impl std::fmt::Display for ChainViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainViolation::PreviousHashMismatch {
                sequence_id,
                expected,
                found,
            } => write!(
                f,
                "block {}: previous_hash {} does not match {}",
                sequence_id, found, expected
            ),
            ChainViolation::CurrentHashMismatch {
                sequence_id,
                stored,
                recomputed,
            } => write!(
                f,
                "block {}: stored hash {} does not match recomputed {}",
                sequence_id, stored, recomputed
            ),
            ChainViolation::SequenceGap { expected, found } => {
                write!(f, "expected block {}, found block {}", expected, found)
            }
            ChainViolation::SequenceOverflow { sequence_id } => write!(
                f,
                "block {} follows the last possible sequence id",
                sequence_id
            ),
        }
    }
}

/// Result of walking a chain
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChainReport {
    pub valid: bool,
    pub blocks_checked: usize,
    pub violations: Vec<ChainViolation>,
}

impl ChainReport {
    /// Violations that reference `sequence_id`
    pub fn violations_for(&self, sequence_id: u64) -> impl Iterator<Item = &ChainViolation> {
        self.violations
            .iter()
            .filter(move |v| v.sequence_id() == sequence_id)
    }
}

/// Walk `blocks` in order from genesis and report every violation
///
/// An empty chain is trivially valid.
pub fn verify_blocks(blocks: &[Block]) -> ChainReport {
    let mut violations = Vec::new();
    let mut expected_previous = GENESIS_HASH;
    // `None` once a block has used up the sequence id space
    let mut expected_sequence = Some(FIRST_SEQUENCE_ID);

    for block in blocks {
        match expected_sequence {
            Some(expected) if block.sequence_id != expected => {
                violations.push(ChainViolation::SequenceGap {
                    expected,
                    found: block.sequence_id,
                })
            }
            Some(_) => {}
            None => violations.push(ChainViolation::SequenceOverflow {
                sequence_id: block.sequence_id,
            }),
        }

        if block.previous_hash != expected_previous {
            violations.push(ChainViolation::PreviousHashMismatch {
                sequence_id: block.sequence_id,
                expected: expected_previous.to_string(),
                found: block.previous_hash.clone(),
            });
        }

        let recomputed = block.recompute_hash();
        if block.current_hash != recomputed {
            violations.push(ChainViolation::CurrentHashMismatch {
                sequence_id: block.sequence_id,
                stored: block.current_hash.clone(),
                recomputed,
            });
        }

        expected_previous = block.current_hash.as_str();
        expected_sequence = block.sequence_id.checked_add(1);
    }

    for violation in &violations {
        tracing::warn!("chain violation: {}", violation);
    }

    ChainReport {
        valid: violations.is_empty(),
        blocks_checked: blocks.len(),
        violations,
    }
}

/// Check that `plaintext` still hashes to the digest committed in `block`
pub fn verify_message_binding(block: &Block, plaintext: &[u8], algorithm: HashAlgorithm) -> bool {
    let recomputed = algorithm.digest(plaintext);
    let bound = recomputed == block.payload_hash;
    if !bound {
        tracing::warn!(
            sequence_id = block.sequence_id,
            "message digest does not match block payload hash"
        );
    }
    bound
}

/// What a reader recovered from one stored message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedPayload {
    pub plaintext: Vec<u8>,
    pub signature: Verification,
}

/// One stored message as presented to [`audit`]
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// Block the message claims to be bound to
    pub sequence_id: u64,
    /// Digest stored alongside the message at send time
    pub stored_digest: String,
    pub algorithm: HashAlgorithm,
    /// The opened message, or why it could not be opened
    pub opened: Result<OpenedPayload, String>,
}

/// A single problem found while auditing messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "finding", rename_all = "snake_case")]
pub enum AuditFinding {
    Chain(ChainViolation),
    /// No block with the message's sequence id exists
    MissingBlock { sequence_id: u64 },
    /// Key unwrap or decryption failed
    Unreadable { sequence_id: u64, reason: String },
    /// Recomputed plaintext digest differs from the stored digest
    DigestMismatch {
        sequence_id: u64,
        stored: String,
        recomputed: String,
    },
    /// Stored digest differs from the block's payload hash
    BlockMismatch {
        sequence_id: u64,
        stored: String,
        payload_hash: String,
    },
    SignatureInvalid { sequence_id: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuditReport {
    pub valid: bool,
    pub messages_checked: usize,
    pub findings: Vec<AuditFinding>,
}

/// Audit a batch of messages against the chain they are bound to
///
/// Combines a full [`verify_blocks`] pass with per-message checks: the
/// message opened, its signature verified, its plaintext still hashes to the
/// stored digest, and that digest is the payload hash of its block.
pub fn audit(blocks: &[Block], entries: &[AuditEntry]) -> AuditReport {
    let chain = verify_blocks(blocks);
    let mut findings: Vec<AuditFinding> =
        chain.violations.into_iter().map(AuditFinding::Chain).collect();

    for entry in entries {
        let sequence_id = entry.sequence_id;

        match blocks.iter().find(|b| b.sequence_id == sequence_id) {
            Some(block) if block.payload_hash != entry.stored_digest => {
                findings.push(AuditFinding::BlockMismatch {
                    sequence_id,
                    stored: entry.stored_digest.clone(),
                    payload_hash: block.payload_hash.clone(),
                })
            }
            Some(_) => {}
            None => findings.push(AuditFinding::MissingBlock { sequence_id }),
        }

        match &entry.opened {
            Ok(opened) => {
                let recomputed = entry.algorithm.digest(&opened.plaintext);
                if recomputed != entry.stored_digest {
                    findings.push(AuditFinding::DigestMismatch {
                        sequence_id,
                        stored: entry.stored_digest.clone(),
                        recomputed,
                    });
                }
                if !opened.signature.is_valid() {
                    findings.push(AuditFinding::SignatureInvalid { sequence_id });
                }
            }
            Err(reason) => findings.push(AuditFinding::Unreadable {
                sequence_id,
                reason: reason.clone(),
            }),
        }
    }

    tracing::debug!(
        messages = entries.len(),
        findings = findings.len(),
        "audit complete"
    );

    AuditReport {
        valid: findings.is_empty(),
        messages_checked: entries.len(),
        findings,
    }
}
