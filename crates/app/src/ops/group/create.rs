use clap::Args;
use common::group::{Group, GroupKeyring};

use super::GroupOpError;

#[derive(Args, Debug, Clone)]
pub struct Create {
    /// Group id
    pub id: String,
}

#[async_trait::async_trait]
impl crate::op::Op for Create {
    type Error = GroupOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        if state.has_keyring(&self.id)? {
            return Err(GroupOpError::AlreadyExists(self.id.clone()));
        }

        let (group, group_keys) = Group::create(self.id.as_str());
        let own_public = state.load_key()?.public();

        // the creator is the first member
        let mut keyring = GroupKeyring::new(group);
        keyring.add_member(&group_keys.secret, &state.config.identity, &own_public)?;

        let key_path = state.save_group_key(&self.id, &group_keys.secret)?;
        state.save_keyring(&keyring)?;

        Ok(format!(
            "Created group {} (fingerprint {})\n- Group key: {}",
            self.id,
            keyring.group().public_key.fingerprint(),
            key_path.display()
        ))
    }
}
