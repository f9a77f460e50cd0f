use clap::Args;

use super::GroupOpError;

#[derive(Args, Debug, Clone)]
pub struct Ls;

#[async_trait::async_trait]
impl crate::op::Op for Ls {
    type Error = GroupOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let (owned, joined) = state.groups()?;

        if owned.is_empty() && joined.is_empty() {
            return Ok("No groups found".to_string());
        }

        let mut lines = Vec::new();
        for id in owned {
            let keyring = state.load_keyring(&id)?;
            let members: Vec<&str> = keyring.members().collect();
            lines.push(format!(
                "{} (owner | fingerprint {} | members: {})",
                id,
                keyring.group().public_key.fingerprint(),
                members.join(", ")
            ));
        }
        for id in joined {
            let member_share = state.load_share(&id)?;
            lines.push(format!(
                "{} (member | fingerprint {})",
                id,
                member_share.group.public_key.fingerprint()
            ));
        }
        Ok(lines.join("\n"))
    }
}
