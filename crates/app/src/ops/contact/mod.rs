use clap::{Args, Subcommand};

pub mod add;
pub mod ls;

use crate::op::Op;

crate::command_enum! {
    (Add, add::Add),
    (Ls, ls::Ls),
}

pub type ContactCommand = Command;

/// Manage the public keys of people you exchange messages with
#[derive(Args, Debug, Clone)]
pub struct Contact {
    #[command(subcommand)]
    pub command: ContactCommand,
}

#[async_trait::async_trait]
impl Op for Contact {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
