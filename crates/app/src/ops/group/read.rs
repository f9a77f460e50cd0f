use std::path::PathBuf;

use clap::Args;
use common::group::GroupMessage;

use super::GroupOpError;
use crate::ops::read::{compare_with_ledger, render};

/// Open a group message with our share
#[derive(Args, Debug, Clone)]
pub struct GroupRead {
    /// Sealed group message JSON, as written by 'group send'
    pub input: PathBuf,
}

#[async_trait::async_trait]
impl crate::op::Op for GroupRead {
    type Error = GroupOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let message: GroupMessage = serde_json::from_str(&std::fs::read_to_string(&self.input)?)?;

        let member_share = state.load_share(&message.group)?;
        let group_secret = member_share
            .share
            .recover_for(&member_share.group, &state.load_key()?)?;
        let sender_public = state.public_key_of(&message.sender)?;
        let ledger = state.ledger().await?;
        let opened = message
            .open_with_group_key(&ledger, &group_secret, &sender_public)
            .await?;
        drop(group_secret);

        let local = compare_with_ledger(&ledger, &message.block).await?;

        Ok(format!(
            "group: {}\n{}",
            message.group,
            render(&message.sender, &message.block, &opened, local)
        ))
    }
}
