use clap::Args;

use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Ls;

#[async_trait::async_trait]
impl crate::op::Op for Ls {
    type Error = StateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let contacts = state.contacts()?;

        if contacts.is_empty() {
            return Ok("No contacts found".to_string());
        }

        let mut lines = Vec::with_capacity(contacts.len());
        for name in contacts {
            let key = state.public_key_of(&name)?;
            lines.push(format!("{} ({})", name, key.fingerprint()));
        }
        Ok(lines.join("\n"))
    }
}
