use clap::Args;
use common::ledger::{payload_digest, LedgerProvider};

use super::LedgerOpError;

/// Append a block for an arbitrary payload
///
/// A 64-character hex payload is recorded as-is; anything else is hashed
/// with SHA-256 first.
#[derive(Args, Debug, Clone)]
pub struct Append {
    pub payload: String,
}

#[async_trait::async_trait]
impl crate::op::Op for Append {
    type Error = LedgerOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ledger = ctx.state()?.ledger().await?;
        let block = ledger.append(payload_digest(&self.payload)).await?;

        Ok(format!(
            "Appended block #{} (payload {}, hash {})",
            block.sequence_id, block.payload_hash, block.current_hash
        ))
    }
}
