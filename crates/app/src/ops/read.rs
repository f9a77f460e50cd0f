use std::path::PathBuf;

use clap::Args;
use common::crypto::Verification;
use common::ledger::{Block, LedgerError, LedgerProvider};
use common::message::{Message, MessageError, OpenedMessage};

use super::input::display_plaintext;
use crate::ledger_store::{FileLedgerError, FileLedgerProvider};
use crate::state::StateError;

/// Open a sealed message addressed to us
#[derive(Args, Debug, Clone)]
pub struct ReadMessage {
    /// Sealed message JSON, as written by `send`
    pub input: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to open message: {0}")]
    Message(#[from] MessageError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError<FileLedgerError>),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// How a message's block relates to the local copy of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalBlock {
    Matches,
    Differs,
    Absent,
}

impl std::fmt::Display for LocalBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocalBlock::Matches => f.write_str("matches local ledger"),
            LocalBlock::Differs => f.write_str("DIFFERS from local ledger"),
            LocalBlock::Absent => f.write_str("not in local ledger"),
        }
    }
}

pub async fn compare_with_ledger(
    ledger: &FileLedgerProvider,
    block: &Block,
) -> Result<LocalBlock, LedgerError<FileLedgerError>> {
    match ledger.block(block.sequence_id).await {
        Ok(local) if &local == block => Ok(LocalBlock::Matches),
        Ok(_) => {
            tracing::warn!(
                sequence_id = block.sequence_id,
                "message block differs from local ledger"
            );
            Ok(LocalBlock::Differs)
        }
        Err(LedgerError::BlockNotFound(_)) => Ok(LocalBlock::Absent),
        Err(e) => Err(e),
    }
}

/// Render the checks, then the plaintext
///
/// A block the local ledger never recorded leaves the binding unverified;
/// that alone is not a warning, since each identity keeps its own chain.
pub fn render(sender: &str, block: &Block, opened: &OpenedMessage, local: LocalBlock) -> String {
    let binding = match opened.binding {
        Some(binding) => binding.to_string(),
        None => "unverified".to_string(),
    };
    let mut lines = vec![
        format!("from: {}", sender),
        format!("block: {} ({})", block.sequence_id, local),
        format!("signature: {}", opened.signature),
        format!("digest: {}", opened.digest),
        format!("binding: {}", binding),
    ];
    let failed = !opened.signature.is_valid()
        || !opened.digest.is_valid()
        || opened.binding == Some(Verification::Invalid)
        || local == LocalBlock::Differs;
    if failed {
        lines.push("WARNING: message failed integrity checks".to_string());
    }
    lines.push(String::new());
    lines.push(display_plaintext(&opened.plaintext));
    lines.join("\n")
}

#[async_trait::async_trait]
impl crate::op::Op for ReadMessage {
    type Error = ReadError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let message: Message = serde_json::from_str(&std::fs::read_to_string(&self.input)?)?;

        if message.receiver != state.config.identity {
            tracing::warn!(
                receiver = %message.receiver,
                identity = %state.config.identity,
                "message is addressed to someone else"
            );
        }

        let sender_public = state.public_key_of(&message.sender)?;
        let ledger = state.ledger().await?;
        let opened = message
            .open(&ledger, &state.load_key()?, &sender_public)
            .await?;

        let local = compare_with_ledger(&ledger, &message.block).await?;

        Ok(render(&message.sender, &message.block, &opened, local))
    }
}
