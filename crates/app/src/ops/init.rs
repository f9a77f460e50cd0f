use clap::Args;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Name to send and receive messages as
    #[arg(long)]
    pub identity: String,

    /// Digest algorithm for new messages (sha256 or sha3_256)
    #[arg(long, default_value = "sha256")]
    pub hash_algorithm: String,

    /// Default log level
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            identity: self.identity.clone(),
            hash_algorithm: self.hash_algorithm.clone(),
            log_level: self.log_level.clone(),
        };

        let state = AppState::init(ctx.config_path.clone(), config)?;
        let public_key = state.load_key()?.public();

        let output = format!(
            "Initialized chainmail directory at: {}\n\
             - Identity: {}\n\
             - Key: {}\n\
             - Public key: {} (fingerprint {})\n\
             - Ledger: {}\n\
             - Groups: {}\n\
             - Contacts: {}\n\
             - Config: {}",
            state.dir.display(),
            state.config.identity,
            state.key_path.display(),
            state.public_key_path.display(),
            public_key.fingerprint(),
            state.ledger_path.display(),
            state.groups_path.display(),
            state.contacts_path.display(),
            state.config_path.display(),
        );

        Ok(output)
    }
}
