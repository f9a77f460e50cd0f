use clap::Args;

use super::GroupOpError;

#[derive(Args, Debug, Clone)]
pub struct Remove {
    /// Group id
    pub id: String,

    /// Member to remove
    pub member: String,
}

#[async_trait::async_trait]
impl crate::op::Op for Remove {
    type Error = GroupOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let mut keyring = state.load_keyring(&self.id)?;
        keyring.remove_member(&self.member)?;
        state.save_keyring(&keyring)?;

        Ok(format!(
            "Removed {} from group {}. The group key was not rotated; \
             run 'chainmail group rotate {}' to lock them out of new messages",
            self.member, self.id, self.id
        ))
    }
}
