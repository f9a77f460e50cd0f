use clap::Args;
use common::ledger::LedgerProvider;

use super::LedgerOpError;

/// List blocks in sequence order
#[derive(Args, Debug, Clone)]
pub struct Show {
    /// Print the blocks as JSON
    #[arg(long)]
    pub json: bool,

    /// Only show the last N blocks
    #[arg(long, short = 'n')]
    pub last: Option<usize>,
}

#[async_trait::async_trait]
impl crate::op::Op for Show {
    type Error = LedgerOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let ledger = ctx.state()?.ledger().await?;
        let mut blocks = ledger.blocks().await?;
        if let Some(last) = self.last {
            blocks = blocks.split_off(blocks.len().saturating_sub(last));
        }

        if self.json {
            return Ok(serde_json::to_string_pretty(&blocks)?);
        }
        if blocks.is_empty() {
            return Ok("Ledger is empty".to_string());
        }

        let output = blocks
            .iter()
            .map(|b| {
                format!(
                    "#{} {} payload={} prev={} hash={}",
                    b.sequence_id, b.timestamp, b.payload_hash, b.previous_hash, b.current_hash
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(output)
    }
}
