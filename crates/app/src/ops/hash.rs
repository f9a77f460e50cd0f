use clap::Args;
use common::crypto::{self, HashError};

use super::input::MessageInput;

#[derive(Args, Debug, Clone)]
pub struct Hash {
    /// sha256 or sha3_256
    #[arg(long, short, default_value = "sha256")]
    pub algorithm: String,

    #[command(flatten)]
    pub input: MessageInput,
}

#[derive(Debug, thiserror::Error)]
pub enum HashOpError {
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error("failed to read message: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Hash {
    type Error = HashOpError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let message = self.input.read()?;
        Ok(crypto::digest_named(&message, &self.algorithm)?)
    }
}
