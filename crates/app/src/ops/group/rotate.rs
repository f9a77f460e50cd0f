use std::collections::HashMap;

use clap::Args;

use super::GroupOpError;

/// Replace the group key and reissue every member's share
#[derive(Args, Debug, Clone)]
pub struct Rotate {
    /// Group id
    pub id: String,
}

#[async_trait::async_trait]
impl crate::op::Op for Rotate {
    type Error = GroupOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let mut keyring = state.load_keyring(&self.id)?;

        let mut member_keys = HashMap::new();
        for member in keyring.members() {
            member_keys.insert(member.to_string(), state.public_key_of(member)?);
        }

        let group_keys = keyring.rotate(&member_keys)?;
        state.save_group_key(&self.id, &group_keys.secret)?;
        state.save_keyring(&keyring)?;

        let others: Vec<&str> = keyring
            .members()
            .filter(|m| *m != state.config.identity)
            .collect();
        let mut output = format!(
            "Rotated group {} (fingerprint {})",
            self.id,
            keyring.group().public_key.fingerprint()
        );
        if !others.is_empty() {
            output.push_str(&format!(
                "\nRedistribute shares with 'chainmail group share {} <member>' to: {}",
                self.id,
                others.join(", ")
            ));
        }
        Ok(output)
    }
}
