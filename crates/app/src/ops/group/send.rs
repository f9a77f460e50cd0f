use std::path::PathBuf;

use clap::Args;
use common::crypto::HashAlgorithm;
use common::group::GroupMessage;

use super::GroupOpError;
use crate::ops::input::{emit, MessageInput};

/// Seal a message for every member of a group
#[derive(Args, Debug, Clone)]
pub struct GroupSend {
    /// Group id
    pub id: String,

    #[command(flatten)]
    pub input: MessageInput,

    /// Write the sealed message JSON here instead of printing it
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Digest algorithm (defaults to the configured one)
    #[arg(long)]
    pub algorithm: Option<HashAlgorithm>,
}

#[async_trait::async_trait]
impl crate::op::Op for GroupSend {
    type Error = GroupOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let algorithm = match self.algorithm {
            Some(algorithm) => algorithm,
            None => state.config.hash_algorithm()?,
        };
        let member_share = state.load_share(&self.id)?;
        let sender_secret = state.load_key()?;
        let plaintext = self.input.read()?;

        let ledger = state.ledger().await?;
        let message = GroupMessage::send(
            &ledger,
            state.config.identity.as_str(),
            &sender_secret,
            &member_share.group,
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
