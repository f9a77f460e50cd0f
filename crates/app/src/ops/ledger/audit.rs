use std::path::PathBuf;

use clap::Args;
use common::crypto::SecretKey;
use common::group::GroupMessage;
use common::ledger::{AuditEntry, LedgerProvider};
use common::message::Message;
use serde::Deserialize;

use super::LedgerOpError;
use crate::state::AppState;

/// Open stored messages and check them against the ledger
///
/// Every problem is collected into one report; the audit never stops at
/// the first one.
#[derive(Args, Debug, Clone)]
pub struct Audit {
    /// Sealed message files written by 'send' or 'group send'
    #[arg(required = true)]
    pub messages: Vec<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredMessage {
    Direct(Message),
    Group(GroupMessage),
}

fn audit_entry(
    state: &AppState,
    own_secret: &SecretKey,
    message: &StoredMessage,
) -> Result<AuditEntry, LedgerOpError> {
    match message {
        StoredMessage::Direct(message) => {
            let sender_public = state.public_key_of(&message.sender)?;
            Ok(message.audit_entry(own_secret, &sender_public))
        }
        StoredMessage::Group(message) => {
            let sender_public = state.public_key_of(&message.sender)?;
            let member_share = state.load_share(&message.group)?;
            let group_secret = member_share
                .share
                .recover_for(&member_share.group, own_secret)?;
            Ok(message.audit_entry(&group_secret, &sender_public))
        }
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Audit {
    type Error = LedgerOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let own_secret = state.load_key()?;

        let mut entries = Vec::with_capacity(self.messages.len());
        for path in &self.messages {
            let message: StoredMessage = serde_json::from_str(&std::fs::read_to_string(path)?)?;
            entries.push(audit_entry(&state, &own_secret, &message)?);
        }

        let ledger = state.ledger().await?;
        let report = ledger.audit(&entries).await?;
        let rendered = serde_json::to_string_pretty(&report)?;

        if report.valid {
            Ok(rendered)
        } else {
            Err(LedgerOpError::Invalid(rendered))
        }
    }
}
