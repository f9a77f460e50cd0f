//! Group key distribution across several members

mod common;

use std::collections::HashMap;

use ::common::crypto::HashAlgorithm;
use ::common::group::{Group, GroupError, GroupKeyShare, GroupKeyring, GroupMessage};
use ::common::ledger::LedgerProvider;

#[test]
fn test_members_independently_recover_group_key() {
    let (group, group_keys) = Group::create("engineering");
    let m1 = common::Identity::new("m1");
    let m2 = common::Identity::new("m2");

    let s1 = GroupKeyShare::issue(&group, &group_keys.secret, &m1.name, &m1.keys.public).unwrap();
    let s2 = GroupKeyShare::issue(&group, &group_keys.secret, &m2.name, &m2.keys.public).unwrap();

    // shares travel as JSON
    let s1: GroupKeyShare = serde_json::from_str(&serde_json::to_string(&s1).unwrap()).unwrap();
    let s2: GroupKeyShare = serde_json::from_str(&serde_json::to_string(&s2).unwrap()).unwrap();

    let g1 = s1.recover(&m1.keys.secret).unwrap();
    let g2 = s2.recover(&m2.keys.secret).unwrap();
    assert_eq!(g1, g2);
    assert_eq!(g1.public(), group.public_key);
}

#[tokio::test]
async fn test_group_conversation() {
    let (ledger, alice, bob) = common::setup_test_env();
    let carol = common::Identity::new("carol");
    let (group, group_keys) = Group::create("friends");

    let mut keyring = GroupKeyring::new(group.clone());
    for member in [&alice, &bob, &carol] {
        keyring
            .add_member(&group_keys.secret, &member.name, &member.keys.public)
            .unwrap();
    }
    assert_eq!(keyring.members().count(), 3);

    let message = GroupMessage::send(
        &ledger,
        &alice.name,
        &alice.keys.secret,
        keyring.group(),
        b"dinner at eight",
        HashAlgorithm::Sha256,
    )
    .await
    .unwrap();

    for member in [&bob, &carol] {
        let share = keyring.share(&member.name).unwrap();
        let opened = message
            .open(&ledger, share, &member.keys.secret, &alice.keys.public)
            .await
            .unwrap();
        assert_eq!(opened.plaintext, b"dinner at eight");
        assert!(opened.is_trusted());
    }

    // a removed member loses their share but the key stays the same
    let removed = keyring.remove_member(&carol.name).unwrap();
    assert!(keyring.share(&carol.name).is_none());
    assert_eq!(keyring.group().public_key, group.public_key);
    assert!(removed.recover(&carol.keys.secret).is_ok());

    // explicit rotation locks the removed member out of new content
    let member_keys: HashMap<String, _> = [&alice, &bob]
        .into_iter()
        .map(|m| (m.name.clone(), m.keys.public))
        .collect();
    keyring.rotate(&member_keys).unwrap();

    let after = GroupMessage::send(
        &ledger,
        &bob.name,
        &bob.keys.secret,
        keyring.group(),
        b"new plans",
        HashAlgorithm::Sha256,
    )
    .await
    .unwrap();

    let old_group_key = removed.recover(&carol.keys.secret).unwrap();
    assert!(matches!(
        after
            .open_with_group_key(&ledger, &old_group_key, &bob.keys.public)
            .await,
        Err(GroupError::Message(e)) if e.is_decryption_failure()
    ));
    let share = keyring.share(&alice.name).unwrap();
    assert_eq!(
        after
            .open(&ledger, share, &alice.keys.secret, &bob.keys.public)
            .await
            .unwrap()
            .plaintext,
        b"new plans"
    );

    assert_eq!(ledger.len().await.unwrap(), 2);
    assert!(ledger.verify_chain().await.unwrap().valid);
}
