//! Tests for keys::share_key, keys::envelope, and keys::store.

mod common;

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use common::{seed_vault, test_storage, unlocked_provider, USER};
use vaultic_core::keys::envelope;
use vaultic_core::remote::{MockRemoteStore, ShareKeyData};
use vaultic_core::{
    select_latest, AddressKeyPair, EncryptedShareKey, KeyError, ShareKey, ShareKeyStore,
    SymmetricKey,
};

fn wrapped_key(master: &SymmetricKey, share_id: &str, rotation: u64) -> EncryptedShareKey {
    let key = ShareKey::new(share_id, rotation, SymmetricKey::generate(), rotation as i64);
    EncryptedShareKey::wrap(master, &key).unwrap()
}

#[test]
fn test_select_latest_picks_max_rotation() {
    let master = SymmetricKey::generate();
    let keys = vec![
        wrapped_key(&master, "share-1", 2),
        wrapped_key(&master, "share-1", 5),
        wrapped_key(&master, "share-1", 3),
    ];

    let latest = select_latest("share-1", &keys).unwrap();
    assert_eq!(latest.key_rotation, 5);
}

#[test]
fn test_select_latest_empty_fails_with_missing_keys() {
    let result = select_latest("share-1", &[]);
    assert!(matches!(result, Err(KeyError::MissingKeys(id)) if id == "share-1"));
}

#[test]
fn test_wrap_unwrap_roundtrip() {
    let master = SymmetricKey::generate();
    let key = ShareKey::new("share-1", 4, SymmetricKey::from_bytes([9; 32]), 100);

    let wrapped = EncryptedShareKey::wrap(&master, &key).unwrap();
    let unwrapped = wrapped.unwrap_with(&master).unwrap();

    assert_eq!(unwrapped.share_id, "share-1");
    assert_eq!(unwrapped.key_rotation, 4);
    assert_eq!(unwrapped.valid_since, 100);
    assert_eq!(unwrapped.key().as_bytes(), &[9; 32]);
}

#[test]
fn test_unwrap_with_wrong_master_fails() {
    let master = SymmetricKey::generate();
    let other = SymmetricKey::generate();
    let key = ShareKey::new("share-1", 1, SymmetricKey::generate(), 0);

    let wrapped = EncryptedShareKey::wrap(&master, &key).unwrap();
    assert!(matches!(
        wrapped.unwrap_with(&other),
        Err(KeyError::Crypto(_))
    ));
}

#[test]
fn test_envelope_seal_open_roundtrip() {
    let address = AddressKeyPair::generate();
    let material = [0xAB; 32];

    let sealed = envelope::seal(&address.public_bytes(), &material).unwrap();
    let opened = envelope::open(&address, &sealed).unwrap();

    assert_eq!(opened, material);
}

#[test]
fn test_envelope_wrong_recipient_fails() {
    let address = AddressKeyPair::generate();
    let other = AddressKeyPair::generate();

    let sealed = envelope::seal(&address.public_bytes(), &[1; 32]).unwrap();
    assert!(envelope::open(&other, &sealed).is_err());
}

#[test]
fn test_envelope_too_short_is_malformed() {
    let address = AddressKeyPair::generate();
    let result = envelope::open(&address, &[0u8; 16]);
    assert!(matches!(result, Err(KeyError::Malformed(_))));
}

#[test]
fn test_key_for_rotation_fetches_from_remote_once() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let address = Arc::new(AddressKeyPair::generate());
    let remote = MockRemoteStore::new();
    let vault_key = SymmetricKey::generate();
    seed_vault(&remote, &address, &vault_key, "share-1", "Personal");

    let store = ShareKeyStore::new(&storage, Arc::clone(&provider), Arc::clone(&address));

    let key = store.key_for_rotation(USER, "share-1", 1, &remote).unwrap();
    assert_eq!(key.key().as_bytes(), vault_key.as_bytes());
    assert_eq!(remote.call_counts().get_share_keys, 1);

    // Second lookup is served from memory.
    store.key_for_rotation(USER, "share-1", 1, &remote).unwrap();
    assert_eq!(remote.call_counts().get_share_keys, 1);

    // And the wrapped copy is durable.
    assert_eq!(storage.share_keys_for(USER, "share-1").unwrap().len(), 1);
}

#[test]
fn test_key_for_unknown_rotation_fails() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let address = Arc::new(AddressKeyPair::generate());
    let remote = MockRemoteStore::new();
    let vault_key = SymmetricKey::generate();
    seed_vault(&remote, &address, &vault_key, "share-1", "Personal");

    let store = ShareKeyStore::new(&storage, Arc::clone(&provider), Arc::clone(&address));

    let result = store.key_for_rotation(USER, "share-1", 7, &remote);
    assert!(matches!(
        result,
        Err(KeyError::RotationNotFound { key_rotation: 7, .. })
    ));
}

#[test]
fn test_apply_rotation_appends_and_latest_moves() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let address = Arc::new(AddressKeyPair::generate());
    let remote = MockRemoteStore::new();
    let vault_key = SymmetricKey::generate();
    seed_vault(&remote, &address, &vault_key, "share-1", "Personal");

    let store = ShareKeyStore::new(&storage, Arc::clone(&provider), Arc::clone(&address));
    store.refresh_from_remote(USER, "share-1", &remote).unwrap();

    let rotated = SymmetricKey::generate();
    let sealed = envelope::seal(&address.public_bytes(), rotated.as_bytes()).unwrap();
    let applied = store
        .apply_rotation(
            USER,
            "share-1",
            &ShareKeyData {
                key_rotation: 2,
                key: BASE64.encode(sealed),
                valid_since: 2,
            },
        )
        .unwrap();
    assert_eq!(applied.key_rotation, 2);

    // Latest now resolves to the new rotation, and rotation 1 stays
    // available for historical content.
    let latest = store.latest_for_share(USER, "share-1", &remote).unwrap();
    assert_eq!(latest.key_rotation, 2);
    assert_eq!(latest.key().as_bytes(), rotated.as_bytes());
    let historical = store.key_for_rotation(USER, "share-1", 1, &remote).unwrap();
    assert_eq!(historical.key().as_bytes(), vault_key.as_bytes());
}

#[test]
fn test_apply_rotation_rejects_non_advancing_id() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let address = Arc::new(AddressKeyPair::generate());
    let remote = MockRemoteStore::new();
    let vault_key = SymmetricKey::generate();
    seed_vault(&remote, &address, &vault_key, "share-1", "Personal");

    let store = ShareKeyStore::new(&storage, Arc::clone(&provider), Arc::clone(&address));
    store.refresh_from_remote(USER, "share-1", &remote).unwrap();

    let sealed = envelope::seal(&address.public_bytes(), &[3; 32]).unwrap();
    let result = store.apply_rotation(
        USER,
        "share-1",
        &ShareKeyData {
            key_rotation: 1,
            key: BASE64.encode(sealed),
            valid_since: 3,
        },
    );
    assert!(matches!(
        result,
        Err(KeyError::RotationNotAdvancing {
            current: 1,
            offered: 1,
            ..
        })
    ));
}

#[test]
fn test_locked_provider_fails_key_decrypt() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let address = Arc::new(AddressKeyPair::generate());
    let remote = MockRemoteStore::new();
    let vault_key = SymmetricKey::generate();
    seed_vault(&remote, &address, &vault_key, "share-1", "Personal");

    let store = ShareKeyStore::new(&storage, Arc::clone(&provider), Arc::clone(&address));
    provider.remove();

    let result = store.key_for_rotation(USER, "share-1", 1, &remote);
    assert!(matches!(result, Err(KeyError::Unavailable(_))));
}
