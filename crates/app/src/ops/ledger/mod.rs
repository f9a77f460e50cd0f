use clap::{Args, Subcommand};
use common::group::GroupError;
use common::ledger::LedgerError;

pub mod append;
pub mod audit;
pub mod show;
pub mod verify;

use crate::ledger_store::FileLedgerError;
use crate::op::Op;
use crate::state::StateError;

crate::command_enum! {
    (Show, show::Show),
    (Append, append::Append),
    (Verify, verify::VerifyChain),
    (Audit, audit::Audit),
}

pub type LedgerCommand = Command;

/// Inspect, extend and audit the local integrity ledger
#[derive(Args, Debug, Clone)]
pub struct Ledger {
    #[command(subcommand)]
    pub command: LedgerCommand,
}

#[async_trait::async_trait]
impl Op for Ledger {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerOpError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError<FileLedgerError>),
    #[error("group error: {0}")]
    Group(#[from] GroupError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// The rendered report of a failed check
    #[error("integrity check failed\n{0}")]
    Invalid(String),
}
