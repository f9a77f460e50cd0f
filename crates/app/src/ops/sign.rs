use std::path::PathBuf;

use clap::Args;
use common::crypto;

use super::input::MessageInput;
use crate::state::{read_secret_key, StateError};

#[derive(Args, Debug, Clone)]
pub struct Sign {
    /// Private key PEM to sign with (defaults to the identity key)
    #[arg(long)]
    pub key: Option<PathBuf>,

    #[command(flatten)]
    pub input: MessageInput,
}

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to read message: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Sign {
    type Error = SignError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let secret = match &self.key {
            Some(path) => read_secret_key(path)?,
            None => ctx.state()?.load_key()?,
        };
        let message = self.input.read()?;

        Ok(crypto::sign(&secret, &message).to_hex())
    }
}
