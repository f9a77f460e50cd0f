use std::path::PathBuf;

use clap::Args;

use super::GroupOpError;
use crate::ops::input::emit;
use crate::state::MemberShare;

/// Add a contact to a group and export their share
#[derive(Args, Debug, Clone)]
pub struct Add {
    /// Group id
    pub id: String,

    /// Contact to add
    pub member: String,

    /// Write the share JSON here instead of printing it
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

#[async_trait::async_trait]
impl crate::op::Op for Add {
    type Error = GroupOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let mut keyring = state.load_keyring(&self.id)?;
        let group_secret = state.load_group_key(&self.id)?;
        let member_public = state.public_key_of(&self.member)?;

        let share = keyring
            .add_member(&group_secret, &self.member, &member_public)?
            .clone();
        drop(group_secret);
        state.save_keyring(&keyring)?;

        let bundle = MemberShare {
            group: keyring.group().clone(),
            share,
        };
        Ok(emit(
            serde_json::to_string_pretty(&bundle)?,
            self.out.as_deref(),
        )?)
    }
}
