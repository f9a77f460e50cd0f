use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use super::block::Block;
use super::provider::{LedgerError, LedgerProvider};

/// In-memory ledger provider over a `Vec` of blocks
///
/// Blocks are stored in sequence order; block `n` lives at index `n - 1`.
#[derive(Debug, Clone)]
pub struct MemoryLedgerProvider {
    inner: Arc<RwLock<Vec<Block>>>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryLedgerProviderError {
    #[error("memory provider error: {0}")]
    Internal(String),
}

impl MemoryLedgerProvider {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Restore a previously persisted chain
    ///
    /// The blocks are taken as-is; call `verify_chain` to check them.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(blocks)),
        }
    }
}

impl Default for MemoryLedgerProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock_error(kind: &str, e: impl std::fmt::Display) -> LedgerError<MemoryLedgerProviderError> {
    LedgerError::Provider(MemoryLedgerProviderError::Internal(format!(
        "failed to acquire {} lock: {}",
        kind, e
    )))
}

#[async_trait]
impl LedgerProvider for MemoryLedgerProvider {
    type Error = MemoryLedgerProviderError;

    async fn append(&self, payload_hash: String) -> Result<Block, LedgerError<Self::Error>> {
        let mut blocks = self.inner.write().map_err(|e| lock_error("write", e))?;

        let block = Block::next(blocks.last(), payload_hash).map_err(LedgerError::Block)?;
        blocks.push(block.clone());

        tracing::debug!(
            sequence_id = block.sequence_id,
            hash = %block.current_hash,
            "appended block"
        );
        Ok(block)
    }

    async fn tail(&self) -> Result<Option<Block>, LedgerError<Self::Error>> {
        let blocks = self.inner.read().map_err(|e| lock_error("read", e))?;
        Ok(blocks.last().cloned())
    }

    async fn block(&self, sequence_id: u64) -> Result<Block, LedgerError<Self::Error>> {
        let blocks = self.inner.read().map_err(|e| lock_error("read", e))?;
        blocks
            .iter()
            .find(|b| b.sequence_id == sequence_id)
            .cloned()
            .ok_or(LedgerError::BlockNotFound(sequence_id))
    }

    async fn blocks(&self) -> Result<Vec<Block>, LedgerError<Self::Error>> {
        let blocks = self.inner.read().map_err(|e| lock_error("read", e))?;
        Ok(blocks.clone())
    }

    async fn len(&self) -> Result<u64, LedgerError<Self::Error>> {
        let blocks = self.inner.read().map_err(|e| lock_error("read", e))?;
        Ok(blocks.len() as u64)
    }
}
