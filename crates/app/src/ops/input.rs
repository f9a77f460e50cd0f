use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;

/// Where a command reads its message bytes from
///
/// With neither flag set the message is read from stdin.
#[derive(Args, Debug, Clone, Default)]
pub struct MessageInput {
    /// Message text
    #[arg(long, short, conflicts_with = "file")]
    pub message: Option<String>,

    /// Read the message from a file
    #[arg(long, short)]
    pub file: Option<PathBuf>,
}

impl MessageInput {
    pub fn read(&self) -> Result<Vec<u8>, std::io::Error> {
        if let Some(message) = &self.message {
            return Ok(message.as_bytes().to_vec());
        }
        if let Some(path) = &self.file {
            return std::fs::read(path);
        }

        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Write `contents` to `out`, or hand it back for printing
pub fn emit(contents: String, out: Option<&Path>) -> Result<String, std::io::Error> {
    match out {
        Some(path) => {
            std::fs::write(path, contents)?;
            Ok(format!("Wrote {}", path.display()))
        }
        None => Ok(contents),
    }
}

/// Plaintext for display; non-UTF-8 content is shown as hex
pub fn display_plaintext(plaintext: &[u8]) -> String {
    match std::str::from_utf8(plaintext) {
        Ok(text) => text.to_string(),
        Err(_) => format!("0x{}", hex::encode(plaintext)),
    }
}
