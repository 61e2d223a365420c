// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Share Key Store
//!
//! Resolves share keys by exact rotation id, not only "latest". Lookup
//! order: in-memory cache, then the local encrypted cache, then a remote
//! fetch. Keys arriving from the server are sealed to the user's address
//! key; the store opens the envelope, re-wraps the key under the master
//! key, and persists it.
//!
//! Rotation history is append-only: a rotation id that does not advance
//! past the current maximum is rejected.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::crypto::{MasterKeyProvider, SymmetricKey};
use crate::remote::{RemoteStore, ShareKeyData};
use crate::storage::Storage;

use super::envelope::{self, AddressKeyPair};
use super::share_key::{select_latest, EncryptedShareKey, KeyError, ShareKey};

/// Per-user share key store.
pub struct ShareKeyStore<'a> {
    storage: &'a Storage,
    provider: Arc<MasterKeyProvider>,
    address: Arc<AddressKeyPair>,
    /// Decrypted keys by share, indexed by rotation.
    cache: Mutex<HashMap<String, BTreeMap<u64, ShareKey>>>,
}

impl<'a> ShareKeyStore<'a> {
    pub fn new(
        storage: &'a Storage,
        provider: Arc<MasterKeyProvider>,
        address: Arc<AddressKeyPair>,
    ) -> Self {
        ShareKeyStore {
            storage,
            provider,
            address,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Decrypts a locally wrapped share key with the master key.
    pub fn decrypt(&self, encrypted: &EncryptedShareKey) -> Result<ShareKey, KeyError> {
        let master = self.provider.get()?;
        encrypted.unwrap_with(&master)
    }

    /// Selects and decrypts the authoritative key from a collection.
    ///
    /// Strictly the highest `key_rotation`; fails with
    /// [`KeyError::MissingKeys`] on an empty collection.
    pub fn latest_key(
        &self,
        share_id: &str,
        keys: &[EncryptedShareKey],
    ) -> Result<ShareKey, KeyError> {
        let latest = select_latest(share_id, keys)?;
        self.decrypt(latest)
    }

    /// Resolves the key for an exact rotation id.
    ///
    /// Falls back to the local cache and then to a remote fetch; fails with
    /// [`KeyError::RotationNotFound`] when the server does not know the
    /// rotation either.
    pub fn key_for_rotation(
        &self,
        user_id: &str,
        share_id: &str,
        key_rotation: u64,
        remote: &dyn RemoteStore,
    ) -> Result<ShareKey, KeyError> {
        if let Some(key) = self.cached(share_id, key_rotation) {
            return Ok(key);
        }

        let rows = self.storage.share_keys_for(user_id, share_id)?;
        if let Some(row) = rows.iter().find(|k| k.key_rotation == key_rotation) {
            let key = self.decrypt(row)?;
            self.remember(key.clone());
            return Ok(key);
        }

        self.refresh_from_remote(user_id, share_id, remote)?;

        self.cached(share_id, key_rotation)
            .ok_or(KeyError::RotationNotFound {
                share_id: share_id.to_string(),
                key_rotation,
            })
    }

    /// Resolves the latest key for a share, fetching from the remote when
    /// no key is known locally.
    pub fn latest_for_share(
        &self,
        user_id: &str,
        share_id: &str,
        remote: &dyn RemoteStore,
    ) -> Result<ShareKey, KeyError> {
        let mut rows = self.storage.share_keys_for(user_id, share_id)?;
        if rows.is_empty() {
            self.refresh_from_remote(user_id, share_id, remote)?;
            rows = self.storage.share_keys_for(user_id, share_id)?;
        }
        self.latest_key(share_id, &rows)
    }

    /// Fetches the share's key set from the remote, opens the address-key
    /// envelopes, and persists the keys wrapped under the master key.
    ///
    /// Returns the number of newly ingested rotations.
    pub fn refresh_from_remote(
        &self,
        user_id: &str,
        share_id: &str,
        remote: &dyn RemoteStore,
    ) -> Result<usize, KeyError> {
        let response = remote.get_share_keys(share_id)?;
        let known: Vec<u64> = self
            .storage
            .share_keys_for(user_id, share_id)?
            .iter()
            .map(|k| k.key_rotation)
            .collect();

        let master = self.provider.get()?;
        let mut wrapped = Vec::new();
        for data in &response.vault_keys {
            if known.contains(&data.key_rotation) {
                continue;
            }
            let key = self.open_wire_key(share_id, data)?;
            wrapped.push(EncryptedShareKey::wrap(&master, &key)?);
            self.remember(key);
        }

        let ingested = wrapped.len();
        if ingested > 0 {
            self.storage.upsert_share_keys(&wrapped, user_id)?;
        }
        Ok(ingested)
    }

    /// Appends a server-issued rotation to a share's key set.
    ///
    /// History is append-only: the offered rotation must be strictly
    /// greater than the current maximum.
    pub fn apply_rotation(
        &self,
        user_id: &str,
        share_id: &str,
        data: &ShareKeyData,
    ) -> Result<ShareKey, KeyError> {
        let current = self
            .storage
            .share_keys_for(user_id, share_id)?
            .iter()
            .map(|k| k.key_rotation)
            .max()
            .unwrap_or(0);
        if data.key_rotation <= current {
            return Err(KeyError::RotationNotAdvancing {
                share_id: share_id.to_string(),
                current,
                offered: data.key_rotation,
            });
        }

        let key = self.open_wire_key(share_id, data)?;
        let master = self.provider.get()?;
        let wrapped = EncryptedShareKey::wrap(&master, &key)?;
        self.storage
            .upsert_share_keys(std::slice::from_ref(&wrapped), user_id)?;
        self.remember(key.clone());
        Ok(key)
    }

    /// Registers a freshly generated vault key (create-vault path) without
    /// a server round-trip.
    pub fn register_local(&self, user_id: &str, key: &ShareKey) -> Result<(), KeyError> {
        let master = self.provider.get()?;
        let wrapped = EncryptedShareKey::wrap(&master, key)?;
        self.storage
            .upsert_share_keys(std::slice::from_ref(&wrapped), user_id)?;
        self.remember(key.clone());
        Ok(())
    }

    /// Drops a share's decrypted keys from memory.
    pub fn forget_share(&self, share_id: &str) {
        self.cache
            .lock()
            .expect("share key cache lock poisoned")
            .remove(share_id);
    }

    /// Drops all decrypted keys from memory (lock/logout).
    pub fn clear(&self) {
        self.cache
            .lock()
            .expect("share key cache lock poisoned")
            .clear();
    }

    fn open_wire_key(&self, share_id: &str, data: &ShareKeyData) -> Result<ShareKey, KeyError> {
        let sealed = BASE64
            .decode(&data.key)
            .map_err(|e| KeyError::Malformed(format!("share key base64: {}", e)))?;
        let raw = envelope::open(&self.address, &sealed)?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| KeyError::Malformed(format!("share {} key length", share_id)))?;
        Ok(ShareKey::new(
            share_id,
            data.key_rotation,
            SymmetricKey::from_bytes(bytes),
            data.valid_since,
        ))
    }

    fn cached(&self, share_id: &str, key_rotation: u64) -> Option<ShareKey> {
        self.cache
            .lock()
            .expect("share key cache lock poisoned")
            .get(share_id)
            .and_then(|keys| keys.get(&key_rotation))
            .cloned()
    }

    fn remember(&self, key: ShareKey) {
        self.cache
            .lock()
            .expect("share key cache lock poisoned")
            .entry(key.share_id.clone())
            .or_default()
            .insert(key.key_rotation, key);
    }
}
