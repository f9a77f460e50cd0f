//! Append-only, hash-linked integrity ledger
//!
//! One block per message. Each block commits to its predecessor's hash and
//! to the digest of the message it records, so both rewriting history and
//! substituting a message after the fact are detectable.

mod block;
mod memory;
mod provider;
mod verify;

pub use block::{
    compute_hash, payload_digest, Block, BlockError, BLOCK_NONCE_SIZE, FIRST_SEQUENCE_ID,
    GENESIS_HASH,
};
pub use memory::{MemoryLedgerProvider, MemoryLedgerProviderError};
pub use provider::{LedgerError, LedgerProvider};
pub use verify::{
    audit, verify_blocks, verify_message_binding, AuditEntry, AuditFinding, AuditReport,
    ChainReport, ChainViolation, OpenedPayload,
};
