use std::path::PathBuf;

use clap::Args;
use common::crypto::{ContentKey, Curve, KeyPair, KeyError, SecretError};

use crate::state::{write_secret, KEY_FILE_NAME, PUBLIC_KEY_FILE_NAME};

/// Generate a content key together with a P-256 key pair
#[derive(Args, Debug, Clone)]
pub struct Keygen {
    /// Curve for the key pair
    #[arg(long, default_value = "p256")]
    pub curve: Curve,

    /// Write key.pem and key.pub.pem here instead of printing them
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum KeygenError {
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("content key error: {0}")]
    Secret(#[from] SecretError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("refusing to overwrite {0}")]
    Exists(PathBuf),
}

#[async_trait::async_trait]
impl crate::op::Op for Keygen {
    type Error = KeygenError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let content_key = ContentKey::generate()?;
        let keys = KeyPair::generate(self.curve);
        let public_pem = keys.public.to_pem()?;

        let Some(dir) = &self.out_dir else {
            let secret_pem = keys.secret.to_pem()?;
            return Ok(format!(
                "content key: {}\n{}{}",
                content_key.to_base64(),
                secret_pem.as_str(),
                public_pem
            ));
        };

        let key_path = dir.join(KEY_FILE_NAME);
        let public_key_path = dir.join(PUBLIC_KEY_FILE_NAME);
        for path in [&key_path, &public_key_path] {
            if path.exists() {
                return Err(KeygenError::Exists(path.clone()));
            }
        }

        std::fs::create_dir_all(dir)?;
        write_secret(&key_path, keys.secret.to_pem()?.as_bytes())?;
        std::fs::write(&public_key_path, public_pem)?;

        Ok(format!(
            "content key: {}\n\
             - Key: {}\n\
             - Public key: {} (fingerprint {})",
            content_key.to_base64(),
            key_path.display(),
            public_key_path.display(),
            keys.public.fingerprint()
        ))
    }
}
