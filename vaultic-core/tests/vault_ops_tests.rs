//! Tests for vault operations: create, update, transfer, pin, delete,
//! and access refresh.

mod common;

use std::sync::Arc;

use common::{item_data, seed_vault, test_storage, unlocked_provider, USER};
use vaultic_core::remote::{MockRemoteStore, RemoteStore};
use vaultic_core::{
    AddressKeyPair, CancellationToken, EngineError, EventDispatcher, MasterKeyProvider, PlanData,
    Storage, SymmetricKey, SyncEngine, VaultMetadata,
};

const SHARE: &str = "share-1";

fn build_engine<'a>(
    remote: MockRemoteStore,
    storage: &'a Storage,
    provider: &Arc<MasterKeyProvider>,
    address: &Arc<AddressKeyPair>,
) -> SyncEngine<'a, MockRemoteStore> {
    SyncEngine::new(
        remote,
        storage,
        Arc::clone(provider),
        Arc::clone(address),
        USER,
        Arc::new(EventDispatcher::new()),
    )
}

#[test]
fn test_create_vault_roundtrip() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let address = Arc::new(AddressKeyPair::generate());
    let engine = build_engine(MockRemoteStore::new(), &storage, &provider, &address);

    let share = engine
        .create_vault(&VaultMetadata::new("Work", "office credentials"))
        .unwrap();
    assert_eq!(share.key_rotation, 1);

    // Cached locally with decrypted metadata.
    let cached = storage.get_share(USER, &share.share_id).unwrap().unwrap();
    assert_eq!(cached.meta.name, "Work");

    // The registered key seals content the server round-trip can decode:
    // seed a remote item under it and sync it back in.
    let key = engine
        .keys()
        .latest_for_share(USER, &share.share_id, engine.remote())
        .unwrap();
    let vault_key = SymmetricKey::from_bytes(*key.key().as_bytes());
    engine.remote().seed_item(
        &share.share_id,
        item_data(&share.share_id, &vault_key, "item-a", 1, "Badge", "me"),
    );
    let summary = engine
        .sync_share(&share.share_id, &CancellationToken::new())
        .unwrap();
    assert_eq!(summary.inserted, 1);
}

#[test]
fn test_update_vault_reseals_metadata() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let address = Arc::new(AddressKeyPair::generate());
    let engine = build_engine(MockRemoteStore::new(), &storage, &provider, &address);

    let share = engine
        .create_vault(&VaultMetadata::new("Work", ""))
        .unwrap();
    let updated = engine
        .update_vault(&share.share_id, &VaultMetadata::new("Work (renamed)", ""))
        .unwrap();
    assert_eq!(updated.meta.name, "Work (renamed)");
    assert_eq!(updated.create_time, share.create_time);

    let cached = storage.get_share(USER, &share.share_id).unwrap().unwrap();
    assert_eq!(cached.meta.name, "Work (renamed)");

    let remote_share = engine
        .remote()
        .get_shares(USER)
        .unwrap()
        .into_iter()
        .find(|s| s.share_id == share.share_id)
        .unwrap();
    assert_eq!(remote_share.key_rotation, 1);
}

#[test]
fn test_update_vault_unknown_share_fails() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let address = Arc::new(AddressKeyPair::generate());
    let engine = build_engine(MockRemoteStore::new(), &storage, &provider, &address);

    let result = engine.update_vault("missing", &VaultMetadata::new("X", ""));
    assert!(matches!(result, Err(EngineError::ShareNotFound { .. })));
}

#[test]
fn test_pin_and_unpin_mirror_locally_after_ack() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let address = Arc::new(AddressKeyPair::generate());
    let remote = MockRemoteStore::new();
    let vault_key = SymmetricKey::generate();
    seed_vault(&remote, &address, &vault_key, SHARE, "Personal");
    remote.seed_item(SHARE, item_data(SHARE, &vault_key, "item-a", 1, "A", "a"));

    let engine = build_engine(remote, &storage, &provider, &address);
    engine.sync(&CancellationToken::new()).unwrap();

    engine.pin_item(SHARE, "item-a").unwrap();
    assert!(engine.remote().item(SHARE, "item-a").unwrap().pinned);
    assert!(
        storage
            .get_item(USER, SHARE, "item-a")
            .unwrap()
            .unwrap()
            .revision
            .pinned
    );

    engine.unpin_item(SHARE, "item-a").unwrap();
    assert!(!engine.remote().item(SHARE, "item-a").unwrap().pinned);
    assert!(
        !storage
            .get_item(USER, SHARE, "item-a")
            .unwrap()
            .unwrap()
            .revision
            .pinned
    );
}

#[test]
fn test_delete_share_clears_cache_and_remote_access() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let address = Arc::new(AddressKeyPair::generate());
    let remote = MockRemoteStore::new();
    let vault_key = SymmetricKey::generate();
    seed_vault(&remote, &address, &vault_key, SHARE, "Personal");
    remote.seed_item(SHARE, item_data(SHARE, &vault_key, "item-a", 1, "A", "a"));

    let engine = build_engine(remote, &storage, &provider, &address);
    engine.sync(&CancellationToken::new()).unwrap();

    engine.delete_share(SHARE).unwrap();

    assert!(storage.get_share(USER, SHARE).unwrap().is_none());
    assert!(storage.get_items(USER, SHARE).unwrap().is_empty());
    assert!(storage.share_keys_for(USER, SHARE).unwrap().is_empty());
    assert!(engine.remote().get_shares(USER).unwrap().is_empty());
}

#[test]
fn test_transfer_ownership_requires_known_shares() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let address = Arc::new(AddressKeyPair::generate());
    let engine = build_engine(MockRemoteStore::new(), &storage, &provider, &address);

    let a = engine.create_vault(&VaultMetadata::new("A", "")).unwrap();
    let b = engine.create_vault(&VaultMetadata::new("B", "")).unwrap();

    engine.transfer_ownership(&a.share_id, &b.share_id).unwrap();

    let result = engine.transfer_ownership(&a.share_id, "missing");
    assert!(matches!(result, Err(EngineError::Remote(_))));
}

#[test]
fn test_refresh_access_caches_snapshot() {
    let provider = unlocked_provider();
    let storage = test_storage(&provider);
    let address = Arc::new(AddressKeyPair::generate());
    let remote = MockRemoteStore::new();
    remote.set_access(
        USER,
        PlanData {
            name: "plus".to_string(),
            vault_limit: -1,
            alias_limit: 10,
            totp_limit: -1,
            trial_end: 0,
        },
    );

    let engine = build_engine(remote, &storage, &provider, &address);
    assert_eq!(engine.cached_access().unwrap(), None);

    let plan = engine.refresh_access().unwrap();
    assert_eq!(plan.name, "plus");
    assert_eq!(plan.vault_limit, None);
    assert_eq!(plan.alias_limit, Some(10));

    assert_eq!(engine.cached_access().unwrap(), Some(plan));
}
