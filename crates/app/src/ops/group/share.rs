use std::path::PathBuf;

use clap::Args;
use common::group::GroupError;

use super::GroupOpError;
use crate::ops::input::emit;
use crate::state::MemberShare;

/// Export a current member's share, e.g. after a rotation
#[derive(Args, Debug, Clone)]
pub struct Share {
    /// Group id
    pub id: String,

    /// Member whose share to export
    pub member: String,

    /// Write the share JSON here instead of printing it
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

#[async_trait::async_trait]
impl crate::op::Op for Share {
    type Error = GroupOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let keyring = ctx.state()?.load_keyring(&self.id)?;
        let share = keyring
            .share(&self.member)
            .ok_or_else(|| GroupError::NotMember(self.member.clone()))?;

        let bundle = MemberShare {
            group: keyring.group().clone(),
            share: share.clone(),
        };
        Ok(emit(
            serde_json::to_string_pretty(&bundle)?,
            self.out.as_deref(),
        )?)
    }
}
