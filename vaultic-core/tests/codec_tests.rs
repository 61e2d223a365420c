//! Tests for the item codec: versioned content format, domain binding,
//! and update request construction.

mod common;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use proptest::prelude::*;

use common::{login_content, share_key};
use vaultic_core::item::{
    build_update_request, decrypt_content, decrypt_vault_meta, encrypt_content,
    encrypt_vault_meta, CodecError,
};
use vaultic_core::{
    ItemContent, ItemRevision, ItemState, SymmetricKey, VaultMetadata, CONTENT_FORMAT_VERSION,
};

fn sample_revision(revision: u64) -> ItemRevision {
    ItemRevision {
        item_id: "item-1".to_string(),
        revision,
        content_format_version: CONTENT_FORMAT_VERSION,
        key_rotation: 1,
        content: Vec::new(),
        item_key: None,
        state: ItemState::Active,
        alias_email: None,
        pinned: false,
        create_time: 1,
        modify_time: 2,
        last_use_time: None,
    }
}

#[test]
fn test_content_roundtrip_all_kinds() {
    let vault_key = SymmetricKey::generate();
    let key = share_key("share-1", 1, &vault_key);

    let contents = [
        login_content("GitHub", "octocat"),
        ItemContent::Note {
            title: "Wifi".to_string(),
            text: "password is on the router".to_string(),
        },
        ItemContent::Alias {
            title: "Shopping alias".to_string(),
            note: String::new(),
        },
        ItemContent::CreditCard {
            title: "Visa".to_string(),
            cardholder: "A. Customer".to_string(),
            number: "4111111111111111".to_string(),
            expiry: "12/30".to_string(),
            security_code: "123".to_string(),
            note: String::new(),
        },
    ];

    for content in contents {
        let sealed = encrypt_content(&content, &key).unwrap();
        let opened = decrypt_content(&sealed, &key, CONTENT_FORMAT_VERSION).unwrap();
        assert_eq!(opened, content);
    }
}

#[test]
fn test_decrypt_with_wrong_share_key_fails() {
    let key = share_key("share-1", 1, &SymmetricKey::generate());
    let other = share_key("share-1", 2, &SymmetricKey::generate());

    let sealed = encrypt_content(&login_content("GitHub", "octocat"), &key).unwrap();
    let result = decrypt_content(&sealed, &other, CONTENT_FORMAT_VERSION);
    assert!(matches!(result, Err(CodecError::Crypto(_))));
}

#[test]
fn test_unknown_format_version_is_unsupported() {
    let key = share_key("share-1", 1, &SymmetricKey::generate());
    let sealed = encrypt_content(&login_content("GitHub", "octocat"), &key).unwrap();

    let result = decrypt_content(&sealed, &key, 99);
    assert!(matches!(result, Err(CodecError::UnsupportedFormat(99))));
}

#[test]
fn test_item_ciphertext_cannot_open_as_vault_content() {
    let vault_key = SymmetricKey::generate();
    let key = share_key("share-1", 1, &vault_key);

    let sealed = encrypt_content(&login_content("GitHub", "octocat"), &key).unwrap();
    let result = decrypt_vault_meta(&sealed, &vault_key, CONTENT_FORMAT_VERSION);
    assert!(matches!(result, Err(CodecError::Crypto(_))));
}

#[test]
fn test_vault_meta_roundtrip() {
    let vault_key = SymmetricKey::generate();
    let meta = VaultMetadata::new("Personal", "everyday logins");

    let sealed = encrypt_vault_meta(&meta, &vault_key).unwrap();
    let opened = decrypt_vault_meta(&sealed, &vault_key, CONTENT_FORMAT_VERSION).unwrap();
    assert_eq!(opened, meta);
}

#[test]
fn test_build_update_request_couples_to_observed_revision() {
    let vault_key = SymmetricKey::generate();
    let key = share_key("share-1", 3, &vault_key);
    let old = sample_revision(7);
    let content = login_content("GitHub", "octocat");

    let request = build_update_request(&old, &key, &content).unwrap();

    assert_eq!(request.last_revision, 7);
    assert_eq!(request.key_rotation, 3);
    assert_eq!(request.content_format_version, CONTENT_FORMAT_VERSION);

    // The wire content is base64 of a blob sealed under the given key.
    let sealed = BASE64.decode(&request.content).unwrap();
    let opened = decrypt_content(&sealed, &key, request.content_format_version).unwrap();
    assert_eq!(opened, content);
}

proptest! {
    #[test]
    fn prop_login_roundtrip(
        title in ".{0,40}",
        username in ".{0,40}",
        password in ".{0,40}",
    ) {
        let key = share_key("share-1", 1, &SymmetricKey::generate());
        let content = ItemContent::Login {
            title,
            username,
            password,
            urls: vec!["https://example.com".to_string()],
            totp_uri: None,
            note: String::new(),
        };
        let sealed = encrypt_content(&content, &key).unwrap();
        let opened = decrypt_content(&sealed, &key, CONTENT_FORMAT_VERSION).unwrap();
        prop_assert_eq!(opened, content);
    }
}
