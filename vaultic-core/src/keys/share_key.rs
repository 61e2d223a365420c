// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Share Key Material
//!
//! A share owns an append-only, rotation-ordered set of symmetric keys.
//! The key with the highest `key_rotation` is authoritative for new
//! encryptions; every older rotation stays available for decrypting
//! historical revisions.

use thiserror::Error;

use crate::crypto::{
    decrypt, encrypt, EncryptionDomain, EncryptionError, KeyUnavailable, SymmetricKey,
};

/// Key management error types.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error(transparent)]
    Unavailable(#[from] KeyUnavailable),

    #[error("share {0} has no keys")]
    MissingKeys(String),

    #[error("share {share_id} has no key for rotation {key_rotation}")]
    RotationNotFound { share_id: String, key_rotation: u64 },

    #[error("rotation {offered} does not advance past {current} for share {share_id}")]
    RotationNotAdvancing {
        share_id: String,
        current: u64,
        offered: u64,
    },

    #[error("crypto failure: {0}")]
    Crypto(#[from] EncryptionError),

    #[error("malformed key material: {0}")]
    Malformed(String),

    #[error("storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    #[error("remote error: {0}")]
    Remote(#[from] crate::remote::RemoteError),
}

/// A decrypted share key for one rotation generation.
///
/// Immutable once issued by the server.
#[derive(Debug, Clone)]
pub struct ShareKey {
    pub share_id: String,
    pub key_rotation: u64,
    pub valid_since: i64,
    key: SymmetricKey,
}

impl ShareKey {
    pub fn new(
        share_id: impl Into<String>,
        key_rotation: u64,
        key: SymmetricKey,
        valid_since: i64,
    ) -> Self {
        ShareKey {
            share_id: share_id.into(),
            key_rotation,
            valid_since,
            key,
        }
    }

    /// The raw symmetric key for this rotation.
    pub fn key(&self) -> &SymmetricKey {
        &self.key
    }
}

/// A share key wrapped under the master key for local storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedShareKey {
    pub share_id: String,
    pub key_rotation: u64,
    pub valid_since: i64,
    pub encrypted_key: Vec<u8>,
}

impl EncryptedShareKey {
    /// Wraps a share key under the master key.
    pub fn wrap(master: &SymmetricKey, key: &ShareKey) -> Result<Self, KeyError> {
        let encrypted_key = encrypt(master, key.key().as_bytes(), EncryptionDomain::ShareKeyWrap)?;
        Ok(EncryptedShareKey {
            share_id: key.share_id.clone(),
            key_rotation: key.key_rotation,
            valid_since: key.valid_since,
            encrypted_key,
        })
    }

    /// Unwraps this key with the master key.
    pub fn unwrap_with(&self, master: &SymmetricKey) -> Result<ShareKey, KeyError> {
        let raw = decrypt(master, &self.encrypted_key, EncryptionDomain::ShareKeyWrap)?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| KeyError::Malformed(format!("share {} key length", self.share_id)))?;
        Ok(ShareKey::new(
            self.share_id.clone(),
            self.key_rotation,
            SymmetricKey::from_bytes(bytes),
            self.valid_since,
        ))
    }
}

/// Selects the authoritative key from a collection: strictly the highest
/// `key_rotation`, never insertion order or timestamp.
///
/// Fails with [`KeyError::MissingKeys`] on an empty collection.
pub fn select_latest<'a>(
    share_id: &str,
    keys: &'a [EncryptedShareKey],
) -> Result<&'a EncryptedShareKey, KeyError> {
    keys.iter()
        .max_by_key(|k| k.key_rotation)
        .ok_or_else(|| KeyError::MissingKeys(share_id.to_string()))
}
