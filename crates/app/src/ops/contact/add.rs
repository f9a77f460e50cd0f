use std::path::PathBuf;

use clap::Args;

use crate::state::{read_public_key, StateError};

#[derive(Args, Debug, Clone)]
pub struct Add {
    /// Name to address this contact by
    pub name: String,

    /// The contact's public key PEM
    pub public_key: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ContactAddError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("{0} is our own identity")]
    OwnIdentity(String),
}

#[async_trait::async_trait]
impl crate::op::Op for Add {
    type Error = ContactAddError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        if self.name == state.config.identity {
            return Err(ContactAddError::OwnIdentity(self.name.clone()));
        }

        let key = read_public_key(&self.public_key)?;
        let path = state.add_contact(&self.name, &key)?;

        Ok(format!(
            "Added contact {} (fingerprint {}) at {}",
            self.name,
            key.fingerprint(),
            path.display()
        ))
    }
}
