//! Group key distribution
//!
//! A group owns one P-256 key pair. Group content is wrapped for the group's
//! public key, and the group's *private* key is wrapped once per member with
//! that member's own public key, producing one [`GroupKeyShare`] each. A
//! member reads group content by recovering the group key from their share.
//!
//! Removing a member deletes their share and nothing else: content they
//! already read stays read, and the group key is not rotated implicitly.
//! [`GroupKeyring::rotate`] is the separate, explicit operation for that.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::crypto::{
    self, Curve, HashAlgorithm, KeyPair, PublicKey, SecretKey, WrapError, WrappedKey,
};
use crate::ledger::{AuditEntry, Block, LedgerProvider};
use crate::message::{self, MessageError, OpenedMessage, Sealed};

#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("wrap error: {0}")]
    Wrap(#[from] WrapError),
    #[error("message error: {0}")]
    Message(#[from] MessageError),
    #[error("{0} is already a member of the group")]
    AlreadyMember(String),
    #[error("{0} is not a member of the group")]
    NotMember(String),
    #[error("no public key supplied for member {0}")]
    MissingMemberKey(String),
    #[error("share belongs to group {found}, expected {expected}")]
    WrongGroup { expected: String, found: String },
    #[error("recovered key does not match the group public key")]
    KeyMismatch,
}

/// A group identity and its public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub public_key: PublicKey,
}

impl Group {
    /// Create a group with a fresh P-256 key pair
    ///
    /// The key pair is returned to the caller once; the core keeps no copy.
    pub fn create(id: impl Into<String>) -> (Self, KeyPair) {
        let keys = KeyPair::generate(Curve::P256);
        let group = Group {
            id: id.into(),
            public_key: keys.public,
        };
        tracing::info!(group = %group.id, key = %group.public_key.fingerprint(), "group created");
        (group, keys)
    }
}

/// The group private key, wrapped for one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupKeyShare {
    pub group: String,
    pub member: String,
    pub wrapped_group_key: WrappedKey,
}

impl GroupKeyShare {
    /// Wrap `group_secret` for `member_public`
    pub fn issue(
        group: &Group,
        group_secret: &SecretKey,
        member: impl Into<String>,
        member_public: &PublicKey,
    ) -> Result<Self, GroupError> {
        let wrapped_group_key = crypto::wrap_secret_key(group_secret, member_public)?;
        Ok(GroupKeyShare {
            group: group.id.clone(),
            member: member.into(),
            wrapped_group_key,
        })
    }

    /// Recover the group private key with the member's own secret key
    pub fn recover(&self, member_secret: &SecretKey) -> Result<SecretKey, GroupError> {
        Ok(crypto::unwrap_secret_key(
            &self.wrapped_group_key,
            member_secret,
        )?)
    }

    /// Recover the group private key and check it against `group`
    pub fn recover_for(
        &self,
        group: &Group,
        member_secret: &SecretKey,
    ) -> Result<SecretKey, GroupError> {
        if self.group != group.id {
            return Err(GroupError::WrongGroup {
                expected: group.id.clone(),
                found: self.group.clone(),
            });
        }
        let secret = self.recover(member_secret)?;
        if secret.public() != group.public_key {
            return Err(GroupError::KeyMismatch);
        }
        Ok(secret)
    }
}

/// Current membership of a group: one share per member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupKeyring {
    group: Group,
    shares: BTreeMap<String, GroupKeyShare>,
}

impl GroupKeyring {
    pub fn new(group: Group) -> Self {
        Self {
            group,
            shares: BTreeMap::new(),
        }
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.shares.keys().map(String::as_str)
    }

    pub fn is_member(&self, member: &str) -> bool {
        self.shares.contains_key(member)
    }

    pub fn share(&self, member: &str) -> Option<&GroupKeyShare> {
        self.shares.get(member)
    }

    /// Issue a share for a new member
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::AlreadyMember`] if `member` already holds a share.
    pub fn add_member(
        &mut self,
        group_secret: &SecretKey,
        member: &str,
        member_public: &PublicKey,
    ) -> Result<&GroupKeyShare, GroupError> {
        if self.is_member(member) {
            return Err(GroupError::AlreadyMember(member.to_string()));
        }
        let share = GroupKeyShare::issue(&self.group, group_secret, member, member_public)?;
        tracing::info!(group = %self.group.id, member, "member added");
        Ok(&*self.shares.entry(member.to_string()).or_insert(share))
    }

    /// Delete a member's share
    ///
    /// Does not rotate the group key.
    pub fn remove_member(&mut self, member: &str) -> Result<GroupKeyShare, GroupError> {
        let share = self
            .shares
            .remove(member)
            .ok_or_else(|| GroupError::NotMember(member.to_string()))?;
        tracing::info!(group = %self.group.id, member, "member removed");
        Ok(share)
    }

    /// Replace the group key and reissue a share to every current member
    ///
    /// `member_keys` must hold the public key of every current member. Nothing
    /// changes if one is missing. Returns the new group key pair.
    pub fn rotate(&mut self, member_keys: &HashMap<String, PublicKey>) -> Result<KeyPair, GroupError> {
        let keys = KeyPair::generate(Curve::P256);
        let group = Group {
            id: self.group.id.clone(),
            public_key: keys.public,
        };

        let mut shares = BTreeMap::new();
        for member in self.shares.keys() {
            let member_public = member_keys
                .get(member)
                .ok_or_else(|| GroupError::MissingMemberKey(member.clone()))?;
            let share = GroupKeyShare::issue(&group, &keys.secret, member.clone(), member_public)?;
            shares.insert(member.clone(), share);
        }

        tracing::info!(
            group = %group.id,
            members = shares.len(),
            key = %group.public_key.fingerprint(),
            "group key rotated"
        );
        self.group = group;
        self.shares = shares;
        Ok(keys)
    }
}

/// A message addressed to a group, bound to one ledger block
///
/// The content key is wrapped once, for the group public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMessage {
    pub sender: String,
    pub group: String,
    #[serde(flatten)]
    pub sealed: Sealed,
    pub block: Block,
}

impl GroupMessage {
    /// Seal `plaintext` for `group` and record it in `ledger`
    pub async fn send<P: LedgerProvider>(
        ledger: &P,
        sender: impl Into<String>,
        sender_secret: &SecretKey,
        group: &Group,
        plaintext: &[u8],
        algorithm: HashAlgorithm,
    ) -> Result<Self, GroupError> {
        let sealed = Sealed::seal(plaintext, sender_secret, &group.public_key, algorithm)?;
        let block = message::append_digest(ledger, &sealed.digest).await?;

        let message = GroupMessage {
            sender: sender.into(),
            group: group.id.clone(),
            sealed,
            block,
        };
        tracing::info!(
            sender = %message.sender,
            group = %message.group,
            sequence_id = message.block.sequence_id,
            "group message sealed"
        );
        Ok(message)
    }

    /// Open with a member's share and personal secret key, checking the
    /// binding against `ledger`
    pub async fn open<P: LedgerProvider>(
        &self,
        ledger: &P,
        share: &GroupKeyShare,
        member_secret: &SecretKey,
        sender_public: &PublicKey,
    ) -> Result<OpenedMessage, GroupError> {
        if share.group != self.group {
            return Err(GroupError::WrongGroup {
                expected: self.group.clone(),
                found: share.group.clone(),
            });
        }
        let group_secret = share.recover(member_secret)?;
        self.open_with_group_key(ledger, &group_secret, sender_public)
            .await
    }

    /// Open with the group private key directly (e.g. by its creator)
    pub async fn open_with_group_key<P: LedgerProvider>(
        &self,
        ledger: &P,
        group_secret: &SecretKey,
        sender_public: &PublicKey,
    ) -> Result<OpenedMessage, GroupError> {
        let recorded = message::recorded_block(ledger, self.block.sequence_id).await?;
        Ok(self
            .sealed
            .open(group_secret, sender_public, recorded.as_ref())?)
    }

    pub fn audit_entry(&self, group_secret: &SecretKey, sender_public: &PublicKey) -> AuditEntry {
        self.sealed
            .audit_entry(self.block.sequence_id, group_secret, sender_public)
    }
}
