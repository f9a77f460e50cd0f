use std::path::PathBuf;

use clap::Args;
use common::crypto::HashAlgorithm;
use common::message::{Message, MessageError};

use super::input::{emit, MessageInput};
use crate::state::StateError;

/// Seal a message for a contact and record it in the ledger
#[derive(Args, Debug, Clone)]
pub struct SendMessage {
    /// Contact to send to
    #[arg(long)]
    pub to: String,

    #[command(flatten)]
    pub input: MessageInput,

    /// Write the sealed message JSON here instead of printing it
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Digest algorithm (defaults to the configured one)
    #[arg(long)]
    pub algorithm: Option<HashAlgorithm>,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("send failed: {0}")]
    Message(#[from] MessageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for SendMessage {
    type Error = SendError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let algorithm = match self.algorithm {
            Some(algorithm) => algorithm,
            None => state.config.hash_algorithm()?,
        };
        let receiver_public = state.public_key_of(&self.to)?;
        let sender_secret = state.load_key()?;
        let plaintext = self.input.read()?;

        let ledger = state.ledger().await?;
        let message = Message::send(
            &ledger,
            state.config.identity.as_str(),
            &sender_secret,
            self.to.as_str(),
            &receiver_public,
            &plaintext,
            algorithm,
        )
        .await?;

        Ok(emit(
            serde_json::to_string_pretty(&message)?,
            self.out.as_deref(),
        )?)
    }
}
