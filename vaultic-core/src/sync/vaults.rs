// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Vault Operations
//!
//! Remote-first mutations on shares: the server acknowledges, then the
//! cache is updated. A newly created vault's key is generated locally,
//! sealed to the creator's address key for upload, and registered in the
//! key store so the vault is usable without a round-trip.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::access::Plan;
use crate::crypto::SymmetricKey;
use crate::error::{EngineError, EngineResult};
use crate::item::{codec, CONTENT_FORMAT_VERSION};
use crate::keys::{envelope, ShareKey};
use crate::remote::{CreateVaultRequest, RemoteStore, UpdateVaultRequest};
use crate::share::{Share, VaultMetadata};

use super::engine::SyncEngine;

/// Returns the current Unix timestamp in seconds.
/// Falls back to 0 if the system clock is before UNIX_EPOCH (should never happen).
fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl<'a, R: RemoteStore> SyncEngine<'a, R> {
    /// Creates a vault: generates a vault key, seals the metadata under
    /// it, wraps the key to the creator's address key, and uploads both.
    pub fn create_vault(&self, meta: &VaultMetadata) -> EngineResult<Share> {
        let vault_key = SymmetricKey::generate();
        let sealed_meta = codec::encrypt_vault_meta(meta, &vault_key)?;
        let sealed_key = envelope::seal(&self.address().public_bytes(), vault_key.as_bytes())?;

        let request = CreateVaultRequest {
            content: BASE64.encode(sealed_meta),
            content_format_version: CONTENT_FORMAT_VERSION,
            encrypted_vault_key: BASE64.encode(sealed_key),
        };
        let data = self.remote().create_vault(self.user_id(), &request)?;

        let share_key = ShareKey::new(
            data.share_id.clone(),
            data.key_rotation,
            vault_key,
            data.create_time,
        );
        self.keys().register_local(self.user_id(), &share_key)?;

        let share = Share {
            share_id: data.share_id,
            meta: meta.clone(),
            content_format_version: data.content_format_version,
            key_rotation: data.key_rotation,
            create_time: data.create_time,
        };
        self.storage()
            .upsert_shares(std::slice::from_ref(&share), self.user_id())?;
        Ok(share)
    }

    /// Updates vault metadata under the latest share key.
    pub fn update_vault(&self, share_id: &str, meta: &VaultMetadata) -> EngineResult<Share> {
        let existing = self
            .storage()
            .get_share(self.user_id(), share_id)?
            .ok_or_else(|| EngineError::ShareNotFound {
                share_id: share_id.to_string(),
            })?;

        let key = self
            .keys()
            .latest_for_share(self.user_id(), share_id, self.remote())?;
        let sealed_meta = codec::encrypt_vault_meta(meta, key.key())?;

        let request = UpdateVaultRequest {
            content: BASE64.encode(sealed_meta),
            content_format_version: CONTENT_FORMAT_VERSION,
            key_rotation: key.key_rotation,
        };
        self.remote().update_vault(share_id, &request)?;

        let share = Share {
            meta: meta.clone(),
            content_format_version: CONTENT_FORMAT_VERSION,
            key_rotation: key.key_rotation,
            ..existing
        };
        self.storage()
            .upsert_shares(std::slice::from_ref(&share), self.user_id())?;
        Ok(share)
    }

    /// Transfers vault ownership to another share. Server-side only; the
    /// local cache is unaffected until the next sync.
    pub fn transfer_ownership(
        &self,
        share_id: &str,
        new_owner_share_id: &str,
    ) -> EngineResult<()> {
        self.remote()
            .transfer_ownership(share_id, new_owner_share_id)?;
        Ok(())
    }

    /// Pins an item, mirroring the flag locally after the server ack.
    pub fn pin_item(&self, share_id: &str, item_id: &str) -> EngineResult<()> {
        self.remote().pin_item(share_id, item_id)?;
        self.storage()
            .set_pinned(self.user_id(), share_id, item_id, true)?;
        Ok(())
    }

    /// Unpins an item, mirroring the flag locally after the server ack.
    pub fn unpin_item(&self, share_id: &str, item_id: &str) -> EngineResult<()> {
        self.remote().unpin_item(share_id, item_id)?;
        self.storage()
            .set_pinned(self.user_id(), share_id, item_id, false)?;
        Ok(())
    }

    /// Leaves a share: removes the user's access remotely, then drops the
    /// share, its keys, and its items from the cache.
    pub fn delete_share(&self, share_id: &str) -> EngineResult<()> {
        self.remote().delete_user_share(share_id, self.user_id())?;
        self.storage().remove_share(share_id, self.user_id())?;
        self.keys().forget_share(share_id);
        Ok(())
    }

    /// Refreshes the entitlement snapshot from the server and caches it.
    pub fn refresh_access(&self) -> EngineResult<Plan> {
        let data = self.remote().get_access(self.user_id())?;
        let plan = Plan::from(data);
        self.storage()
            .upsert_access(&plan, self.user_id(), current_timestamp())?;
        Ok(plan)
    }

    /// Returns the cached entitlement snapshot, if any.
    pub fn cached_access(&self) -> EngineResult<Option<Plan>> {
        Ok(self.storage().get_access(self.user_id())?)
    }
}
