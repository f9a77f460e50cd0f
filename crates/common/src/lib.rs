/**
 * Cryptographic types and operations.
 *  - Hashing, P-256 keys and ECDSA signatures
 *  - AES-256-GCM content encryption
 *  - ECIES key wrapping
 */
pub mod crypto;
/**
 * Group key pairs and the per-member
 *  shares of the group private key.
 */
pub mod group;
/**
 * The append-only, hash-linked integrity
 *  ledger and its storage abstraction.
 */
pub mod ledger;
/**
 * Sealing, sending and opening messages
 *  bound to the ledger.
 */
pub mod message;

pub mod prelude {
    pub use crate::crypto::{
        ContentKey, Curve, HashAlgorithm, KeyPair, PublicKey, SecretKey, Signature, Verification,
        WrappedKey,
    };
    pub use crate::group::{Group, GroupError, GroupKeyShare, GroupKeyring, GroupMessage};
    pub use crate::ledger::{
        Block, ChainReport, ChainViolation, LedgerError, LedgerProvider, MemoryLedgerProvider,
    };
    pub use crate::message::{Message, MessageError, OpenedMessage};
}
