//! Sealing and opening individual messages
//!
//! Sending composes every primitive in the crate: a fresh content key is
//! generated, wrapped for the recipient and used to encrypt the plaintext;
//! the plaintext is signed by the sender and digested; the digest is
//! appended to the ledger and the resulting block is bound to the message.
//! The content key is dropped once wrapped and never stored.
//!
//! Opening reverses it. Decryption failures are errors; signature, digest
//! and ledger-binding outcomes are returned as [`Verification`] states the
//! caller has to inspect. The binding is checked against the ledger's own
//! block, never the copy carried inside the message record.

use serde::{Deserialize, Serialize};

use crate::crypto::{
    self, ContentKey, EncryptedEnvelope, HashAlgorithm, PublicKey, SecretError, SecretKey,
    Signature, Verification, WrapError, WrappedKey,
};
use crate::ledger::{self, AuditEntry, Block, LedgerError, LedgerProvider, OpenedPayload};

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
    #[error("wrap error: {0}")]
    Wrap(#[from] WrapError),
    #[error("ledger error: {0}")]
    Ledger(String),
}

impl MessageError {
    /// True when the content key or ciphertext failed to authenticate
    pub fn is_decryption_failure(&self) -> bool {
        match self {
            MessageError::Secret(SecretError::DecryptionFailed) => true,
            MessageError::Wrap(e) => e.is_decryption_failure(),
            _ => false,
        }
    }
}

/// The cryptographic body shared by individual and group messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sealed {
    pub envelope: EncryptedEnvelope,
    pub wrapped_key: WrappedKey,
    pub signature: Signature,
    /// Hex digest of the plaintext
    pub digest: String,
    pub algorithm: HashAlgorithm,
}

/// Result of opening a message
///
/// Only produced when decryption succeeded; each integrity check is reported
/// separately so a bad signature is never mistaken for ordinary content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedMessage {
    pub plaintext: Vec<u8>,
    /// Sender's signature over the plaintext
    pub signature: Verification,
    /// Plaintext digest matches the digest stored with the message
    pub digest: Verification,
    /// Plaintext digest matches the payload hash the ledger holds for the
    /// message's block; `None` when the ledger has no such block
    pub binding: Option<Verification>,
}

impl OpenedMessage {
    /// Every check passed, including the ledger binding
    pub fn is_trusted(&self) -> bool {
        self.signature.is_valid()
            && self.digest.is_valid()
            && self.binding == Some(Verification::Valid)
    }
}

impl Sealed {
    /// Encrypt, sign and digest `plaintext` for `recipient`
    pub fn seal(
        plaintext: &[u8],
        sender_secret: &SecretKey,
        recipient: &PublicKey,
        algorithm: HashAlgorithm,
    ) -> Result<Self, MessageError> {
        let content_key = ContentKey::generate()?;
        let wrapped_key = crypto::wrap_key(&content_key, recipient)?;
        let envelope = crypto::encrypt(plaintext, &content_key)?;
        drop(content_key);

        Ok(Sealed {
            envelope,
            wrapped_key,
            signature: crypto::sign(sender_secret, plaintext),
            digest: algorithm.digest(plaintext),
            algorithm,
        })
    }

    /// Unwrap, decrypt and check against `recorded`, the ledger's block
    pub fn open(
        &self,
        recipient_secret: &SecretKey,
        sender: &PublicKey,
        recorded: Option<&Block>,
    ) -> Result<OpenedMessage, MessageError> {
        let content_key = crypto::unwrap_key(&self.wrapped_key, recipient_secret)?;
        let plaintext = crypto::decrypt(&self.envelope, &content_key)?;
        drop(content_key);

        let signature = Verification::from(crypto::verify(sender, &plaintext, &self.signature));
        if !signature.is_valid() {
            tracing::warn!(
                sender = %sender.fingerprint(),
                "message signature is invalid"
            );
        }
        let digest = Verification::from(self.algorithm.digest(&plaintext) == self.digest);
        let binding = recorded.map(|block| {
            Verification::from(ledger::verify_message_binding(
                block,
                &plaintext,
                self.algorithm,
            ))
        });

        Ok(OpenedMessage {
            plaintext,
            signature,
            digest,
            binding,
        })
    }

    pub(crate) fn audit_entry(
        &self,
        sequence_id: u64,
        recipient_secret: &SecretKey,
        sender: &PublicKey,
    ) -> AuditEntry {
        let opened = crypto::unwrap_key(&self.wrapped_key, recipient_secret)
            .map_err(MessageError::from)
            .and_then(|key| crypto::decrypt(&self.envelope, &key).map_err(MessageError::from))
            .map(|plaintext| OpenedPayload {
                signature: crypto::verify(sender, &plaintext, &self.signature).into(),
                plaintext,
            })
            .map_err(|e| e.to_string());

        AuditEntry {
            sequence_id,
            stored_digest: self.digest.clone(),
            algorithm: self.algorithm,
            opened,
        }
    }
}

pub(crate) async fn append_digest<P: LedgerProvider>(
    ledger: &P,
    digest: &str,
) -> Result<Block, MessageError> {
    ledger
        .append(digest.to_string())
        .await
        .map_err(|e| MessageError::Ledger(e.to_string()))
}

/// The ledger's own copy of block `sequence_id`, if it holds one
pub(crate) async fn recorded_block<P: LedgerProvider>(
    ledger: &P,
    sequence_id: u64,
) -> Result<Option<Block>, MessageError> {
    match ledger.block(sequence_id).await {
        Ok(block) => Ok(Some(block)),
        Err(LedgerError::BlockNotFound(_)) => {
            tracing::debug!(sequence_id, "message block is not in this ledger");
            Ok(None)
        }
        Err(e) => Err(MessageError::Ledger(e.to_string())),
    }
}

/// A message from one identity to another, bound to one ledger block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub receiver: String,
    #[serde(flatten)]
    pub sealed: Sealed,
    pub block: Block,
}

impl Message {
    /// Seal `plaintext` for `receiver` and record it in `ledger`
    pub async fn send<P: LedgerProvider>(
        ledger: &P,
        sender: impl Into<String>,
        sender_secret: &SecretKey,
        receiver: impl Into<String>,
        receiver_public: &PublicKey,
        plaintext: &[u8],
        algorithm: HashAlgorithm,
    ) -> Result<Self, MessageError> {
        let sealed = Sealed::seal(plaintext, sender_secret, receiver_public, algorithm)?;
        let block = append_digest(ledger, &sealed.digest).await?;

        let message = Message {
            sender: sender.into(),
            receiver: receiver.into(),
            sealed,
            block,
        };
        tracing::info!(
            sender = %message.sender,
            receiver = %message.receiver,
            sequence_id = message.block.sequence_id,
            "message sealed"
        );
        Ok(message)
    }

    /// Open with the receiver's secret key, checking the sender's signature
    /// and the binding against `ledger`
    pub async fn open<P: LedgerProvider>(
        &self,
        ledger: &P,
        receiver_secret: &SecretKey,
        sender_public: &PublicKey,
    ) -> Result<OpenedMessage, MessageError> {
        let recorded = recorded_block(ledger, self.block.sequence_id).await?;
        self.sealed
            .open(receiver_secret, sender_public, recorded.as_ref())
    }

    /// Open for an integrity audit, capturing failures instead of returning them
    pub fn audit_entry(&self, receiver_secret: &SecretKey, sender_public: &PublicKey) -> AuditEntry {
        self.sealed
            .audit_entry(self.block.sequence_id, receiver_secret, sender_public)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::{Curve, KeyPair};
    use crate::ledger::MemoryLedgerProvider;

    async fn send_hello(
        ledger: &MemoryLedgerProvider,
        alice: &KeyPair,
        bob: &KeyPair,
    ) -> Message {
        Message::send(
            ledger,
            "alice",
            &alice.secret,
            "bob",
            &bob.public,
            b"hello",
            HashAlgorithm::Sha256,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_send_and_open() {
        let ledger = MemoryLedgerProvider::new();
        let alice = KeyPair::generate(Curve::P256);
        let bob = KeyPair::generate(Curve::P256);

        let message = send_hello(&ledger, &alice, &bob).await;
        assert_eq!(message.block.sequence_id, 1);
        assert_eq!(message.block.payload_hash, message.sealed.digest);

        let opened = message
            .open(&ledger, &bob.secret, &alice.public)
            .await
            .unwrap();
        assert_eq!(opened.plaintext, b"hello");
        assert!(opened.is_trusted());
    }

    #[tokio::test]
    async fn test_wrong_receiver_is_decryption_failure() {
        let ledger = MemoryLedgerProvider::new();
        let alice = KeyPair::generate(Curve::P256);
        let bob = KeyPair::generate(Curve::P256);
        let eve = KeyPair::generate(Curve::P256);

        let message = send_hello(&ledger, &alice, &bob).await;
        let err = message
            .open(&ledger, &eve.secret, &alice.public)
            .await
            .unwrap_err();
        assert!(err.is_decryption_failure());
    }

    #[tokio::test]
    async fn test_forged_sender_is_flagged_not_hidden() {
        let ledger = MemoryLedgerProvider::new();
        let alice = KeyPair::generate(Curve::P256);
        let bob = KeyPair::generate(Curve::P256);
        let mallory = KeyPair::generate(Curve::P256);

        let message = send_hello(&ledger, &alice, &bob).await;
        let opened = message
            .open(&ledger, &bob.secret, &mallory.public)
            .await
            .unwrap();

        assert_eq!(opened.plaintext, b"hello");
        assert_eq!(opened.signature, Verification::Invalid);
        assert!(!opened.is_trusted());
    }

    #[tokio::test]
    async fn test_tampered_ciphertext_is_error() {
        let ledger = MemoryLedgerProvider::new();
        let alice = KeyPair::generate(Curve::P256);
        let bob = KeyPair::generate(Curve::P256);

        let mut message = send_hello(&ledger, &alice, &bob).await;
        message.sealed.envelope.ciphertext[0] ^= 0x01;

        let err = message
            .open(&ledger, &bob.secret, &alice.public)
            .await
            .unwrap_err();
        assert!(matches!(err, MessageError::Secret(SecretError::DecryptionFailed)));
    }

    #[tokio::test]
    async fn test_substituted_digest_is_flagged() {
        let ledger = MemoryLedgerProvider::new();
        let alice = KeyPair::generate(Curve::P256);
        let bob = KeyPair::generate(Curve::P256);

        let mut message = send_hello(&ledger, &alice, &bob).await;
        message.sealed.digest = HashAlgorithm::Sha256.digest(b"goodbye");

        let opened = message
            .open(&ledger, &bob.secret, &alice.public)
            .await
            .unwrap();
        assert_eq!(opened.digest, Verification::Invalid);
        // the plaintext itself still matches what the ledger recorded
        assert_eq!(opened.binding, Some(Verification::Valid));
        assert_eq!(opened.signature, Verification::Valid);
        assert!(!opened.is_trusted());
    }

    #[tokio::test]
    async fn test_rewritten_record_fails_ledger_binding() {
        let ledger = MemoryLedgerProvider::new();
        let alice = KeyPair::generate(Curve::P256);
        let bob = KeyPair::generate(Curve::P256);

        let original = Message::send(
            &ledger,
            "alice",
            &alice.secret,
            "bob",
            &bob.public,
            b"pay 10",
            HashAlgorithm::Sha256,
        )
        .await
        .unwrap();

        // re-seal different plaintext and make the embedded block agree with it
        let mut rewritten = original.clone();
        rewritten.sealed =
            Sealed::seal(b"pay 1000", &alice.secret, &bob.public, HashAlgorithm::Sha256).unwrap();
        rewritten.block.payload_hash = rewritten.sealed.digest.clone();
        rewritten.block.current_hash = rewritten.block.recompute_hash();

        let opened = rewritten
            .open(&ledger, &bob.secret, &alice.public)
            .await
            .unwrap();
        assert_eq!(opened.plaintext, b"pay 1000");
        assert_eq!(opened.signature, Verification::Valid);
        assert_eq!(opened.digest, Verification::Valid);
        assert_eq!(opened.binding, Some(Verification::Invalid));
        assert!(!opened.is_trusted());
        assert!(!ledger
            .verify_message_binding(1, &opened.plaintext, HashAlgorithm::Sha256)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_block_missing_from_ledger_is_unbound() {
        let sender_ledger = MemoryLedgerProvider::new();
        let other_ledger = MemoryLedgerProvider::new();
        let alice = KeyPair::generate(Curve::P256);
        let bob = KeyPair::generate(Curve::P256);

        let message = send_hello(&sender_ledger, &alice, &bob).await;
        let opened = message
            .open(&other_ledger, &bob.secret, &alice.public)
            .await
            .unwrap();

        assert_eq!(opened.binding, None);
        assert_eq!(opened.signature, Verification::Valid);
        assert!(!opened.is_trusted());
    }

    #[tokio::test]
    async fn test_audit_entry() {
        let ledger = MemoryLedgerProvider::new();
        let alice = KeyPair::generate(Curve::P256);
        let bob = KeyPair::generate(Curve::P256);
        let eve = KeyPair::generate(Curve::P256);

        let message = send_hello(&ledger, &alice, &bob).await;

        let good = message.audit_entry(&bob.secret, &alice.public);
        let bad = message.audit_entry(&eve.secret, &alice.public);
        assert!(good.opened.is_ok());
        assert!(bad.opened.is_err());

        let report = ledger.audit(&[good]).await.unwrap();
        assert!(report.valid);
        let report = ledger.audit(&[bad]).await.unwrap();
        assert!(!report.valid);
    }

    #[tokio::test]
    async fn test_message_json_roundtrip() {
        let ledger = MemoryLedgerProvider::new();
        let alice = KeyPair::generate(Curve::P256);
        let bob = KeyPair::generate(Curve::P256);

        let message = send_hello(&ledger, &alice, &bob).await;
        let json = serde_json::to_string(&message).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, message);
        assert!(parsed
            .open(&ledger, &bob.secret, &alice.public)
            .await
            .unwrap()
            .is_trusted());
    }
}
