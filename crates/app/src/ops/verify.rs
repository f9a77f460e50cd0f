use std::path::PathBuf;

use clap::Args;
use common::crypto::{self, Signature, SignatureError, Verification};

use super::input::MessageInput;
use crate::state::{read_public_key, StateError};

/// Check a hex signature; prints `valid` or `invalid`
#[derive(Args, Debug, Clone)]
pub struct Verify {
    /// Public key PEM of the signer
    #[arg(long, conflicts_with = "from")]
    pub public_key: Option<PathBuf>,

    /// Contact name of the signer
    #[arg(long)]
    pub from: Option<String>,

    /// Hex-encoded signature
    #[arg(long, short)]
    pub signature: String,

    #[command(flatten)]
    pub input: MessageInput,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error("failed to read message: {0}")]
    Io(#[from] std::io::Error),
    #[error("either --public-key or --from is required")]
    NoSigner,
}

#[async_trait::async_trait]
impl crate::op::Op for Verify {
    type Error = VerifyError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let public = match (&self.public_key, &self.from) {
            (Some(path), _) => read_public_key(path)?,
            (None, Some(name)) => ctx.state()?.public_key_of(name)?,
            (None, None) => return Err(VerifyError::NoSigner),
        };
        let signature = Signature::from_hex(&self.signature)?;
        let message = self.input.read()?;

        let verification = Verification::from(crypto::verify(&public, &message, &signature));
        Ok(verification.to_string())
    }
}
