//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use vaultic_core::item::{encrypt_content, encrypt_vault_meta, EncryptedItem};
use vaultic_core::keys::envelope;
use vaultic_core::remote::{ItemRevisionData, MockRemoteStore, ShareData, ShareKeyData};
use vaultic_core::{
    AddressKeyPair, ItemContent, ItemRevision, ItemState, MasterKeyProvider, ShareKey, Storage,
    SymmetricKey, VaultMetadata, CONTENT_FORMAT_VERSION,
};

pub const USER: &str = "user-1";

pub fn unlocked_provider() -> Arc<MasterKeyProvider> {
    Arc::new(MasterKeyProvider::unlocked(SymmetricKey::generate()))
}

pub fn test_storage(provider: &Arc<MasterKeyProvider>) -> Storage {
    Storage::in_memory(Arc::clone(provider)).unwrap()
}

pub fn share_key(share_id: &str, key_rotation: u64, vault_key: &SymmetricKey) -> ShareKey {
    ShareKey::new(share_id, key_rotation, vault_key.clone(), 1)
}

/// Seeds a share with its metadata and a rotation-1 vault key sealed to
/// the given address key, the way the server would deliver them.
pub fn seed_vault(
    remote: &MockRemoteStore,
    address: &AddressKeyPair,
    vault_key: &SymmetricKey,
    share_id: &str,
    name: &str,
) {
    let meta = VaultMetadata::new(name, "");
    let sealed_meta = encrypt_vault_meta(&meta, vault_key).unwrap();
    remote.seed_share(ShareData {
        share_id: share_id.to_string(),
        content: BASE64.encode(sealed_meta),
        content_format_version: CONTENT_FORMAT_VERSION,
        key_rotation: 1,
        create_time: 1,
    });

    let sealed_key = envelope::seal(&address.public_bytes(), vault_key.as_bytes()).unwrap();
    remote.seed_share_key(
        share_id,
        ShareKeyData {
            key_rotation: 1,
            key: BASE64.encode(sealed_key),
            valid_since: 1,
        },
    );
}

pub fn login_content(title: &str, username: &str) -> ItemContent {
    ItemContent::Login {
        title: title.to_string(),
        username: username.to_string(),
        password: "hunter2".to_string(),
        urls: Vec::new(),
        totp_uri: None,
        note: String::new(),
    }
}

/// A wire revision sealed under the share's rotation-1 vault key.
pub fn item_data(
    share_id: &str,
    vault_key: &SymmetricKey,
    item_id: &str,
    revision: u64,
    title: &str,
    username: &str,
) -> ItemRevisionData {
    let content = login_content(title, username);
    let sealed = encrypt_content(&content, &share_key(share_id, 1, vault_key)).unwrap();
    ItemRevisionData {
        item_id: item_id.to_string(),
        revision,
        content_format_version: CONTENT_FORMAT_VERSION,
        key_rotation: 1,
        content: BASE64.encode(sealed),
        item_key: None,
        state: 1,
        alias_email: None,
        pinned: false,
        create_time: 1,
        modify_time: revision as i64,
        last_use_time: None,
    }
}

/// A cache row as reconciliation would have produced it.
pub fn cache_row(
    storage: &Storage,
    share_id: &str,
    item_id: &str,
    revision: u64,
    content: &ItemContent,
) -> EncryptedItem {
    EncryptedItem {
        share_id: share_id.to_string(),
        revision: ItemRevision {
            item_id: item_id.to_string(),
            revision,
            content_format_version: CONTENT_FORMAT_VERSION,
            key_rotation: 1,
            content: Vec::new(),
            item_key: None,
            state: ItemState::Active,
            alias_email: None,
            pinned: false,
            create_time: 1,
            modify_time: revision as i64,
            last_use_time: None,
        },
        encrypted_content: storage.encrypt_item_content(content).unwrap(),
        is_login_item: content.is_login(),
    }
}
