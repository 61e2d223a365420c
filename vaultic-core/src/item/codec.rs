// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Item Codec
//!
//! Turns structured item content into versioned ciphertext and back, and
//! binds ciphertext to its context through the AEAD domain: item content
//! and vault content are separate encryption domains, so a blob sealed as
//! one can never be opened as the other.
//!
//! Decryption dispatches on `content_format_version` for forward
//! compatibility; unknown versions fail with
//! [`CodecError::UnsupportedFormat`].

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{
    decrypt, encrypt, EncryptionDomain, EncryptionError, SymmetricKey, MIN_SEALED_LEN,
};
use crate::keys::ShareKey;
use crate::share::VaultMetadata;

use super::content::{ItemContent, CONTENT_FORMAT_VERSION};
use super::revision::ItemRevision;

/// Codec error types.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("unsupported content format version {0}")]
    UnsupportedFormat(u32),

    #[error("crypto failure: {0}")]
    Crypto(#[from] EncryptionError),

    #[error("content serialization failed: {0}")]
    Serialization(String),
}

/// Optimistic-concurrency write request.
///
/// `last_revision` is the revision the client last observed; the server
/// rejects the write when its current revision no longer matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    pub key_rotation: u64,
    pub last_revision: u64,
    /// Base64 of the sealed content.
    pub content: String,
    pub content_format_version: u32,
}

/// Encrypts item content under a share key.
///
/// The result is stamped with [`CONTENT_FORMAT_VERSION`] by the callers
/// that persist or upload it. Fails with [`CodecError::Crypto`] when the
/// seal fails or produces a blob below the minimum sane length.
pub fn encrypt_content(content: &ItemContent, key: &ShareKey) -> Result<Vec<u8>, CodecError> {
    let plaintext =
        bincode::serialize(content).map_err(|e| CodecError::Serialization(e.to_string()))?;
    let sealed = encrypt(key.key(), &plaintext, EncryptionDomain::ItemContent)?;
    if sealed.len() < MIN_SEALED_LEN {
        return Err(CodecError::Crypto(EncryptionError::EncryptionFailed));
    }
    Ok(sealed)
}

/// Decrypts item content, dispatching on the content format version.
pub fn decrypt_content(
    ciphertext: &[u8],
    key: &ShareKey,
    content_format_version: u32,
) -> Result<ItemContent, CodecError> {
    match content_format_version {
        1 => {
            let plaintext = decrypt(key.key(), ciphertext, EncryptionDomain::ItemContent)?;
            bincode::deserialize(&plaintext).map_err(|e| CodecError::Serialization(e.to_string()))
        }
        version => Err(CodecError::UnsupportedFormat(version)),
    }
}

/// Encrypts vault metadata under a share key, in the vault-content domain.
pub fn encrypt_vault_meta(meta: &VaultMetadata, key: &SymmetricKey) -> Result<Vec<u8>, CodecError> {
    let plaintext =
        bincode::serialize(meta).map_err(|e| CodecError::Serialization(e.to_string()))?;
    let sealed = encrypt(key, &plaintext, EncryptionDomain::VaultContent)?;
    if sealed.len() < MIN_SEALED_LEN {
        return Err(CodecError::Crypto(EncryptionError::EncryptionFailed));
    }
    Ok(sealed)
}

/// Decrypts vault metadata, dispatching on the content format version.
pub fn decrypt_vault_meta(
    ciphertext: &[u8],
    key: &SymmetricKey,
    content_format_version: u32,
) -> Result<VaultMetadata, CodecError> {
    match content_format_version {
        1 => {
            let plaintext = decrypt(key, ciphertext, EncryptionDomain::VaultContent)?;
            bincode::deserialize(&plaintext).map_err(|e| CodecError::Serialization(e.to_string()))
        }
        version => Err(CodecError::UnsupportedFormat(version)),
    }
}

/// Builds an update request from the revision the client last observed,
/// sealing the new content under the latest share key.
pub fn build_update_request(
    old_revision: &ItemRevision,
    latest_key: &ShareKey,
    new_content: &ItemContent,
) -> Result<UpdateItemRequest, CodecError> {
    let sealed = encrypt_content(new_content, latest_key)?;
    Ok(UpdateItemRequest {
        key_rotation: latest_key.key_rotation,
        last_revision: old_revision.revision,
        content: BASE64.encode(sealed),
        content_format_version: CONTENT_FORMAT_VERSION,
    })
}
