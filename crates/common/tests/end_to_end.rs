//! Alice sends "hello" to Bob, step by step and through `Message`

mod common;

use ::common::crypto::{self, ContentKey, HashAlgorithm, Verification};
use ::common::ledger::{LedgerProvider, GENESIS_HASH};
use ::common::message::Message;

#[tokio::test]
async fn test_alice_sends_bob_hello_step_by_step() {
    common::init_tracing();
    let (ledger, alice, bob) = common::setup_test_env();
    let plaintext = b"hello";

    // sender side
    let content_key = ContentKey::generate().unwrap();
    let wrapped = crypto::wrap_key(&content_key, &bob.keys.public).unwrap();
    let envelope = crypto::encrypt(plaintext, &content_key).unwrap();
    let signature = crypto::sign(&alice.keys.secret, plaintext);
    let digest = crypto::digest(plaintext, HashAlgorithm::Sha256);
    let block = ledger.append(digest.clone()).await.unwrap();
    drop(content_key);

    assert_eq!(block.previous_hash, GENESIS_HASH);
    assert_eq!(block.payload_hash, digest);

    // the wrapped key crosses the wire as JSON
    let wrapped = crypto::WrappedKey::from_json(&wrapped.to_json().unwrap()).unwrap();

    // receiver side
    let recovered_key = crypto::unwrap_key(&wrapped, &bob.keys.secret).unwrap();
    let recovered = crypto::decrypt(&envelope, &recovered_key).unwrap();
    assert_eq!(recovered, plaintext);

    assert!(crypto::verify(&alice.keys.public, &recovered, &signature));
    assert_eq!(crypto::digest(&recovered, HashAlgorithm::Sha256), digest);
    assert!(ledger
        .verify_message_binding(block.sequence_id, &recovered, HashAlgorithm::Sha256)
        .await
        .unwrap());
    assert!(ledger.verify_chain().await.unwrap().valid);
}

#[tokio::test]
async fn test_alice_sends_bob_hello_as_message() {
    let (ledger, alice, bob) = common::setup_test_env();

    let message = Message::send(
        &ledger,
        &alice.name,
        &alice.keys.secret,
        &bob.name,
        &bob.keys.public,
        b"hello",
        HashAlgorithm::Sha256,
    )
    .await
    .unwrap();

    let opened = message
        .open(&ledger, &bob.keys.secret, &alice.keys.public)
        .await
        .unwrap();
    assert_eq!(opened.plaintext, b"hello");
    assert_eq!(opened.signature, Verification::Valid);
    assert_eq!(opened.digest, Verification::Valid);
    assert_eq!(opened.binding, Some(Verification::Valid));

    let stored = ledger.block(message.block.sequence_id).await.unwrap();
    assert_eq!(stored, message.block);
    assert!(ledger.verify_chain().await.unwrap().valid);
}

#[tokio::test]
async fn test_conversation_builds_one_chain() {
    let (ledger, alice, bob) = common::setup_test_env();

    let mut messages = Vec::new();
    for i in 0..10 {
        let (from, to) = if i % 2 == 0 { (&alice, &bob) } else { (&bob, &alice) };
        let text = format!("message number {}", i);
        let message = Message::send(
            &ledger,
            &from.name,
            &from.keys.secret,
            &to.name,
            &to.keys.public,
            text.as_bytes(),
            HashAlgorithm::Sha256,
        )
        .await
        .unwrap();
        messages.push((message, from, to, text));
    }

    for (message, from, to, text) in &messages {
        let opened = message
            .open(&ledger, &to.keys.secret, &from.keys.public)
            .await
            .unwrap();
        assert_eq!(opened.plaintext, text.as_bytes());
        assert!(opened.is_trusted());
    }

    let entries: Vec<_> = messages
        .iter()
        .map(|(m, from, to, _)| m.audit_entry(&to.keys.secret, &from.keys.public))
        .collect();
    let report = ledger.audit(&entries).await.unwrap();
    assert!(report.valid, "{:?}", report.findings);
    assert_eq!(report.messages_checked, 10);
}

#[tokio::test]
async fn test_undecryptable_message_is_never_empty_content() {
    let (ledger, alice, bob) = common::setup_test_env();
    let message = Message::send(
        &ledger,
        &alice.name,
        &alice.keys.secret,
        &bob.name,
        &bob.keys.public,
        b"",
        HashAlgorithm::Sha256,
    )
    .await
    .unwrap();

    // genuinely empty content opens fine
    let opened = message
        .open(&ledger, &bob.keys.secret, &alice.keys.public)
        .await
        .unwrap();
    assert!(opened.plaintext.is_empty());
    assert!(opened.is_trusted());

    // a failed decrypt is an error, not an empty plaintext
    let mut tampered = message.clone();
    tampered.sealed.envelope.ciphertext[0] ^= 0x80;
    let err = tampered
        .open(&ledger, &bob.keys.secret, &alice.keys.public)
        .await
        .unwrap_err();
    assert!(err.is_decryption_failure());
}
