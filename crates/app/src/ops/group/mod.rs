use clap::{Args, Subcommand};
use common::group::GroupError;
use common::ledger::LedgerError;
use common::message::MessageError;

pub mod add;
pub mod create;
pub mod import;
pub mod ls;
pub mod read;
pub mod remove;
pub mod rotate;
pub mod send;
pub mod share;

use crate::ledger_store::FileLedgerError;
use crate::op::Op;
use crate::state::StateError;

crate::command_enum! {
    (Create, create::Create),
    (Ls, ls::Ls),
    (Add, add::Add),
    (Share, share::Share),
    (Remove, remove::Remove),
    (Rotate, rotate::Rotate),
    (Import, import::Import),
    (Send, send::GroupSend),
    (Read, read::GroupRead),
}

pub type GroupCommand = Command;

/// Create groups, distribute key shares and exchange group messages
#[derive(Args, Debug, Clone)]
pub struct Group {
    #[command(subcommand)]
    pub command: GroupCommand,
}

#[async_trait::async_trait]
impl Op for Group {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GroupOpError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("group error: {0}")]
    Group(#[from] GroupError),
    #[error("message error: {0}")]
    Message(#[from] MessageError),
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError<FileLedgerError>),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("group {0} already exists")]
    AlreadyExists(String),
    #[error("share is for {member}, not {identity}")]
    NotOurShare { member: String, identity: String },
}
