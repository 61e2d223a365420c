//! Tests for crypto::encryption and the master key provider.

use proptest::prelude::*;

use vaultic_core::crypto::{decrypt, encrypt, MIN_SEALED_LEN};
use vaultic_core::{EncryptionDomain, EncryptionError, MasterKeyProvider, SymmetricKey};

#[test]
fn test_encrypt_decrypt_roundtrip() {
    let key = SymmetricKey::generate();
    let plaintext = b"correct horse battery staple";

    let sealed = encrypt(&key, plaintext, EncryptionDomain::ItemContent).unwrap();
    let opened = decrypt(&key, &sealed, EncryptionDomain::ItemContent).unwrap();

    assert_eq!(opened, plaintext);
}

#[test]
fn test_sealed_blob_meets_minimum_length() {
    let key = SymmetricKey::generate();
    let sealed = encrypt(&key, b"", EncryptionDomain::ItemContent).unwrap();
    assert!(sealed.len() >= MIN_SEALED_LEN);
}

#[test]
fn test_decrypt_with_wrong_key_fails() {
    let key = SymmetricKey::generate();
    let other = SymmetricKey::generate();

    let sealed = encrypt(&key, b"secret", EncryptionDomain::ItemContent).unwrap();
    let result = decrypt(&other, &sealed, EncryptionDomain::ItemContent);

    assert!(matches!(result, Err(EncryptionError::DecryptionFailed)));
}

#[test]
fn test_domain_separation_rejects_cross_domain_ciphertext() {
    let key = SymmetricKey::generate();

    let sealed = encrypt(&key, b"vault item", EncryptionDomain::ItemContent).unwrap();
    let result = decrypt(&key, &sealed, EncryptionDomain::VaultContent);

    assert!(matches!(result, Err(EncryptionError::DecryptionFailed)));
}

#[test]
fn test_tampered_ciphertext_fails() {
    let key = SymmetricKey::generate();
    let mut sealed = encrypt(&key, b"secret", EncryptionDomain::ItemContent).unwrap();

    let last = sealed.len() - 1;
    sealed[last] ^= 0x01;

    let result = decrypt(&key, &sealed, EncryptionDomain::ItemContent);
    assert!(matches!(result, Err(EncryptionError::DecryptionFailed)));
}

#[test]
fn test_too_short_ciphertext_fails() {
    let key = SymmetricKey::generate();
    let result = decrypt(&key, &[0u8; 16], EncryptionDomain::ItemContent);
    assert!(matches!(result, Err(EncryptionError::CiphertextTooShort)));
}

#[test]
fn test_key_debug_is_redacted() {
    let key = SymmetricKey::from_bytes([0x42; 32]);
    let debug = format!("{:?}", key);
    assert!(debug.contains("REDACTED"));
    assert!(!debug.contains("42"));
}

#[test]
fn test_fingerprint_is_stable_and_short() {
    let key = SymmetricKey::from_bytes([7; 32]);
    let fp = key.fingerprint();
    assert_eq!(fp, key.fingerprint());
    assert_eq!(fp.len(), 8);
}

#[test]
fn test_provider_fails_before_unlock() {
    let provider = MasterKeyProvider::new();
    assert!(provider.get().is_err());
    assert!(!provider.is_unlocked());
}

#[test]
fn test_provider_install_then_get() {
    let provider = MasterKeyProvider::new();
    provider.install(SymmetricKey::from_bytes([1; 32]));

    let key = provider.get().unwrap();
    assert_eq!(key.as_bytes(), &[1; 32]);
}

#[test]
fn test_provider_remove_makes_get_fail() {
    let provider = MasterKeyProvider::unlocked(SymmetricKey::generate());
    assert!(provider.get().is_ok());

    provider.remove();
    assert!(provider.get().is_err());
    assert!(!provider.is_unlocked());
}

#[test]
fn test_password_unlock_is_deterministic() {
    let a = MasterKeyProvider::new();
    let b = MasterKeyProvider::new();
    a.unlock_with_password(b"password123", b"salty-salt-16byt").unwrap();
    b.unlock_with_password(b"password123", b"salty-salt-16byt").unwrap();

    // Same password and salt must derive the same key: data encrypted
    // under one session decrypts under the other.
    let sealed = encrypt(&a.get().unwrap(), b"data", EncryptionDomain::CacheRow).unwrap();
    let opened = decrypt(&b.get().unwrap(), &sealed, EncryptionDomain::CacheRow).unwrap();
    assert_eq!(opened, b"data");
}

proptest! {
    #[test]
    fn prop_roundtrip_any_payload(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let key = SymmetricKey::generate();
        let sealed = encrypt(&key, &data, EncryptionDomain::ItemContent).unwrap();
        let opened = decrypt(&key, &sealed, EncryptionDomain::ItemContent).unwrap();
        prop_assert_eq!(opened, data);
    }
}
