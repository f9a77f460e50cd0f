//! Shared test utilities for messaging and ledger integration tests
#![allow(dead_code)]

use common::crypto::{Curve, KeyPair};
use common::ledger::MemoryLedgerProvider;

/// A named identity with its key pair
pub struct Identity {
    pub name: String,
    pub keys: KeyPair,
}

impl Identity {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            keys: KeyPair::generate(Curve::P256),
        }
    }
}

/// Set up an empty ledger and the two usual correspondents
pub fn setup_test_env() -> (MemoryLedgerProvider, Identity, Identity) {
    (
        MemoryLedgerProvider::new(),
        Identity::new("alice"),
        Identity::new("bob"),
    )
}

/// Route `tracing` output to the test harness when `RUST_LOG` is set
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
