// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Symmetric Encryption (XChaCha20-Poly1305)
//!
//! Authenticated encryption with domain-separated associated data.
//! Ciphertext from one domain (e.g. item content) cannot be opened in
//! another (e.g. vault content), so sealed blobs cannot be replayed
//! across contexts.
//!
//! Ciphertext format: `nonce (24 bytes) || ciphertext || tag (16 bytes)`

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::XChaCha20Poly1305;
use ring::rand::{SecureRandom, SystemRandom};
use thiserror::Error;
use zeroize::Zeroize;

/// Encryption error types.
#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("Encryption failed")]
    EncryptionFailed,
    #[error("Decryption failed: data may be corrupted or wrong key")]
    DecryptionFailed,
    #[error("Ciphertext too short")]
    CiphertextTooShort,
}

/// Nonce size for XChaCha20-Poly1305 (192 bits = 24 bytes).
const NONCE_SIZE: usize = 24;
/// Authentication tag size.
const TAG_SIZE: usize = 16;

/// Minimum length of a well-formed sealed blob.
///
/// Anything shorter indicates a sealing failure upstream and must never be
/// persisted or sent to the server.
pub const MIN_SEALED_LEN: usize = NONCE_SIZE + TAG_SIZE;

/// Encryption context bound into the AEAD as associated data.
///
/// Closed set: every sealed blob in the system belongs to exactly one of
/// these domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionDomain {
    /// Item content sealed under a share key.
    ItemContent,
    /// Vault metadata sealed under a share key.
    VaultContent,
    /// A share key wrapped under the master key for local storage.
    ShareKeyWrap,
    /// A share key sealed to an address key (asymmetric envelope).
    ShareKeyEnvelope,
    /// A locally re-encrypted cache row under the master key.
    CacheRow,
}

impl EncryptionDomain {
    /// Fixed context tag mixed into the AEAD associated data.
    pub fn tag(self) -> &'static [u8] {
        match self {
            EncryptionDomain::ItemContent => b"vaultic.itemcontent",
            EncryptionDomain::VaultContent => b"vaultic.vaultcontent",
            EncryptionDomain::ShareKeyWrap => b"vaultic.sharekey.wrap",
            EncryptionDomain::ShareKeyEnvelope => b"vaultic.sharekey.envelope",
            EncryptionDomain::CacheRow => b"vaultic.cache.row",
        }
    }
}

/// 256-bit symmetric encryption key.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; 32],
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Don't expose key bytes in debug output
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl SymmetricKey {
    /// Generates a new random symmetric key.
    pub fn generate() -> Self {
        let rng = SystemRandom::new();
        let key = ring::rand::generate::<[u8; 32]>(&rng)
            .expect("System RNG should not fail")
            .expose();
        SymmetricKey { bytes: key }
    }

    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        SymmetricKey { bytes }
    }

    /// Returns a reference to the key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Short hex fingerprint for diagnostics.
    ///
    /// Derived from a SHA-256 digest, never from the key bytes directly,
    /// and truncated to 4 bytes.
    pub fn fingerprint(&self) -> String {
        let digest = ring::digest::digest(&ring::digest::SHA256, &self.bytes);
        hex::encode(&digest.as_ref()[..4])
    }
}

/// Encrypts data under the given domain.
///
/// Output format: `nonce (24 bytes) || ciphertext || tag (16 bytes)`
pub fn encrypt(
    key: &SymmetricKey,
    plaintext: &[u8],
    domain: EncryptionDomain,
) -> Result<Vec<u8>, EncryptionError> {
    let rng = SystemRandom::new();

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| EncryptionError::EncryptionFailed)?;

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = chacha20poly1305::XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: domain.tag(),
            },
        )
        .map_err(|_| EncryptionError::EncryptionFailed)?;

    // A seal that produced less than the tag has failed, whatever the
    // AEAD implementation claims.
    if ciphertext.len() < TAG_SIZE {
        return Err(EncryptionError::EncryptionFailed);
    }

    let mut output = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);

    Ok(output)
}

/// Decrypts data sealed by [`encrypt`] in the same domain.
///
/// Fails with [`EncryptionError::DecryptionFailed`] on a wrong key, a
/// tampered blob, or a domain mismatch.
pub fn decrypt(
    key: &SymmetricKey,
    sealed: &[u8],
    domain: EncryptionDomain,
) -> Result<Vec<u8>, EncryptionError> {
    if sealed.len() < MIN_SEALED_LEN {
        return Err(EncryptionError::CiphertextTooShort);
    }

    let nonce = chacha20poly1305::XNonce::from_slice(&sealed[..NONCE_SIZE]);
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: &sealed[NONCE_SIZE..],
                aad: domain.tag(),
            },
        )
        .map_err(|_| EncryptionError::DecryptionFailed)
}
