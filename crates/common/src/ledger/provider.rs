use std::fmt::{Debug, Display};

use async_trait::async_trait;

use super::block::{Block, BlockError};
use super::verify::{self, AuditEntry, AuditReport, ChainReport};
use crate::crypto::HashAlgorithm;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError<T> {
    /// Error from the backing store
    #[error("unhandled ledger provider error: {0}")]
    Provider(#[from] T),
    /// No block exists with the requested sequence id
    #[error("block not found at sequence id {0}")]
    BlockNotFound(u64),
    /// A new block could not be built
    #[error("failed to build block: {0}")]
    Block(BlockError),
}

/// Storage for the single, append-only integrity chain
///
/// Implementations own the tail pointer. `append` must be atomic with respect
/// to other appends: the read-tail / build-block / write-tail sequence runs as
/// one critical section, so no two blocks ever share a `previous_hash`.
/// Reads return consistent snapshots.
#[async_trait]
pub trait LedgerProvider: Send + Sync + std::fmt::Debug + Clone + 'static {
    type Error: Display + Debug;

    /// Append a block committing to `payload_hash`
    ///
    /// # Arguments
    /// * `payload_hash` - The digest bound to the message this block records
    ///
    /// # Returns
    /// * `Ok(Block)` - The newly persisted tail
    /// * `Err(LedgerError)` - The block could not be built or stored
    async fn append(&self, payload_hash: String) -> Result<Block, LedgerError<Self::Error>>;

    /// The current tail, or `None` for an empty chain
    async fn tail(&self) -> Result<Option<Block>, LedgerError<Self::Error>>;

    /// Get a block by sequence id
    ///
    /// Should fail with `Err(LedgerError::BlockNotFound)` if it does not exist.
    async fn block(&self, sequence_id: u64) -> Result<Block, LedgerError<Self::Error>>;

    /// Every block in sequence order, as one consistent snapshot
    async fn blocks(&self) -> Result<Vec<Block>, LedgerError<Self::Error>>;

    /// Number of blocks in the chain
    async fn len(&self) -> Result<u64, LedgerError<Self::Error>>;

    async fn is_empty(&self) -> Result<bool, LedgerError<Self::Error>> {
        Ok(self.len().await? == 0)
    }

    /// Walk the chain from genesis and report every violation found
    async fn verify_chain(&self) -> Result<ChainReport, LedgerError<Self::Error>> {
        let blocks = self.blocks().await?;
        Ok(verify::verify_blocks(&blocks))
    }

    /// Check `plaintext` against the payload hash of the stored block `sequence_id`
    async fn verify_message_binding(
        &self,
        sequence_id: u64,
        plaintext: &[u8],
        algorithm: HashAlgorithm,
    ) -> Result<bool, LedgerError<Self::Error>> {
        let block = self.block(sequence_id).await?;
        Ok(verify::verify_message_binding(&block, plaintext, algorithm))
    }

    /// Audit opened messages against a snapshot of the chain
    async fn audit(&self, entries: &[AuditEntry]) -> Result<AuditReport, LedgerError<Self::Error>> {
        let blocks = self.blocks().await?;
        Ok(verify::audit(&blocks, entries))
    }
}
