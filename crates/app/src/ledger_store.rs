use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use common::ledger::{Block, LedgerError, LedgerProvider};
use tokio::sync::Mutex;

/// Ledger provider persisted as a JSON array of blocks
///
/// The file is the only copy of the chain: every read loads it and every
/// append re-reads the tail while holding an exclusive lock on a sibling
/// `.lock` file, so appends from separate handles and separate processes
/// never build on the same tail. The chain file is only ever replaced whole,
/// via a temp file and a rename, so readers always see a complete chain.
#[derive(Debug, Clone)]
pub struct FileLedgerProvider {
    path: PathBuf,
    lock_path: PathBuf,
    // keeps appends from one handle off the blocking pool while another waits
    write_lock: Arc<Mutex<()>>,
}

#[derive(thiserror::Error, Debug)]
pub enum FileLedgerError {
    #[error("ledger io error: {0}")]
    Io(#[from] io::Error),
    #[error("ledger json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ledger append task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn decode(read: io::Result<Vec<u8>>) -> Result<Vec<Block>, FileLedgerError> {
    match read {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn write_blocks(path: &Path, blocks: &[Block]) -> Result<(), FileLedgerError> {
    let json = serde_json::to_vec_pretty(blocks)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Read the tail, build the next block and write the chain back, all under
/// the file lock. Nothing is returned until the new chain is on disk.
fn append_locked(
    path: &Path,
    lock_path: &Path,
    payload_hash: String,
) -> Result<Block, LedgerError<FileLedgerError>> {
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)
        .map_err(FileLedgerError::from)?;
    let mut lock = fd_lock::RwLock::new(lock_file);
    let _held = lock.write().map_err(FileLedgerError::from)?;

    let mut blocks = decode(fs::read(path))?;
    let block = Block::next(blocks.last(), payload_hash).map_err(LedgerError::Block)?;
    blocks.push(block.clone());
    write_blocks(path, &blocks)?;

    tracing::debug!(
        sequence_id = block.sequence_id,
        hash = %block.current_hash,
        "appended block"
    );
    Ok(block)
}

impl FileLedgerProvider {
    /// Open the chain at `path`; a missing file is an empty chain
    ///
    /// The file is parsed once here so a corrupt ledger fails early. Loaded
    /// blocks are not checked; use `verify_chain` for that.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, FileLedgerError> {
        let path = path.as_ref().to_path_buf();
        let blocks = decode(tokio::fs::read(&path).await)?;

        tracing::debug!(path = %path.display(), blocks = blocks.len(), "opened ledger");
        Ok(Self {
            lock_path: path.with_extension("json.lock"),
            path,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    async fn load(&self) -> Result<Vec<Block>, FileLedgerError> {
        decode(tokio::fs::read(&self.path).await)
    }
}

#[async_trait]
impl LedgerProvider for FileLedgerProvider {
    type Error = FileLedgerError;

    async fn append(&self, payload_hash: String) -> Result<Block, LedgerError<Self::Error>> {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();

        tokio::task::spawn_blocking(move || append_locked(&path, &lock_path, payload_hash))
            .await
            .map_err(FileLedgerError::from)?
    }

    async fn tail(&self) -> Result<Option<Block>, LedgerError<Self::Error>> {
        Ok(self.load().await?.pop())
    }

    async fn block(&self, sequence_id: u64) -> Result<Block, LedgerError<Self::Error>> {
        self.load()
            .await?
            .into_iter()
            .find(|b| b.sequence_id == sequence_id)
            .ok_or(LedgerError::BlockNotFound(sequence_id))
    }

    async fn blocks(&self) -> Result<Vec<Block>, LedgerError<Self::Error>> {
        Ok(self.load().await?)
    }

    async fn len(&self) -> Result<u64, LedgerError<Self::Error>> {
        Ok(self.load().await?.len() as u64)
    }
}
