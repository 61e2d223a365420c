// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory remote store for tests.
//!
//! Behaves like the real server for the slice this engine cares about:
//! revisions are bumped on every write, stale writes are rejected, and a
//! flipped availability switch makes every call fail the way a transport
//! outage would.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use uuid::Uuid;

use crate::access::PlanData;
use crate::item::UpdateItemRequest;

use super::store::{
    CreateVaultRequest, ItemRevisionsPage, ItemRevisionData, RemoteError, RemoteResult,
    ShareData, ShareKeyData, ShareKeysResponse, UpdateVaultRequest,
};

/// Counters for asserting on traffic shape in tests.
#[derive(Debug, Default, Clone)]
pub struct CallCounts {
    pub get_shares: u32,
    pub get_share_keys: u32,
    pub get_item_revisions: u32,
    pub get_item_revision: u32,
    pub update_item: u32,
}

#[derive(Default)]
struct Inner {
    shares: HashMap<String, ShareData>,
    keys: HashMap<String, Vec<ShareKeyData>>,
    items: HashMap<String, BTreeMap<String, ItemRevisionData>>,
    access: HashMap<String, PlanData>,
    unavailable: bool,
    clock: i64,
    calls: CallCounts,
}

impl Inner {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }
}

/// In-memory [`RemoteStore`](super::RemoteStore) implementation.
pub struct MockRemoteStore {
    inner: Mutex<Inner>,
    page_size: usize,
}

impl Default for MockRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRemoteStore {
    pub fn new() -> Self {
        MockRemoteStore {
            inner: Mutex::new(Inner::default()),
            page_size: 100,
        }
    }

    /// Small pages force the engine through the paging loop.
    pub fn with_page_size(page_size: usize) -> Self {
        MockRemoteStore {
            inner: Mutex::new(Inner::default()),
            page_size,
        }
    }

    /// Flips the availability switch; every call fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    pub fn seed_share(&self, share: ShareData) {
        self.lock().shares.insert(share.share_id.clone(), share);
    }

    pub fn seed_share_key(&self, share_id: &str, key: ShareKeyData) {
        self.lock()
            .keys
            .entry(share_id.to_string())
            .or_default()
            .push(key);
    }

    pub fn seed_item(&self, share_id: &str, item: ItemRevisionData) {
        self.lock()
            .items
            .entry(share_id.to_string())
            .or_default()
            .insert(item.item_id.clone(), item);
    }

    /// Drops an item from the remote, as a deletion on another device would.
    pub fn remove_item(&self, share_id: &str, item_id: &str) {
        if let Some(items) = self.lock().items.get_mut(share_id) {
            items.remove(item_id);
        }
    }

    pub fn set_access(&self, user_id: &str, plan: PlanData) {
        self.lock().access.insert(user_id.to_string(), plan);
    }

    /// Current server-side state of an item.
    pub fn item(&self, share_id: &str, item_id: &str) -> Option<ItemRevisionData> {
        self.lock()
            .items
            .get(share_id)
            .and_then(|items| items.get(item_id))
            .cloned()
    }

    pub fn call_counts(&self) -> CallCounts {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("mock remote lock poisoned")
    }

    fn check_available(inner: &Inner) -> RemoteResult<()> {
        if inner.unavailable {
            Err(RemoteError::Unavailable("mock remote offline".into()))
        } else {
            Ok(())
        }
    }
}

impl super::RemoteStore for MockRemoteStore {
    fn get_shares(&self, _user_id: &str) -> RemoteResult<Vec<ShareData>> {
        let mut inner = self.lock();
        inner.calls.get_shares += 1;
        Self::check_available(&inner)?;
        let mut shares: Vec<ShareData> = inner.shares.values().cloned().collect();
        shares.sort_by(|a, b| a.share_id.cmp(&b.share_id));
        Ok(shares)
    }

    fn get_share_keys(&self, share_id: &str) -> RemoteResult<ShareKeysResponse> {
        let mut inner = self.lock();
        inner.calls.get_share_keys += 1;
        Self::check_available(&inner)?;
        let vault_keys = inner
            .keys
            .get(share_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("share {}", share_id)))?;
        let total = vault_keys.len() as u64;
        Ok(ShareKeysResponse {
            vault_keys,
            item_keys: Vec::new(),
            total,
        })
    }

    fn get_item_revisions(&self, share_id: &str, page: u32) -> RemoteResult<ItemRevisionsPage> {
        let mut inner = self.lock();
        inner.calls.get_item_revisions += 1;
        Self::check_available(&inner)?;
        let items = inner.items.get(share_id).cloned().unwrap_or_default();
        let all: Vec<ItemRevisionData> = items.into_values().collect();
        let start = page as usize * self.page_size;
        let revisions = all
            .iter()
            .skip(start)
            .take(self.page_size)
            .cloned()
            .collect();
        Ok(ItemRevisionsPage {
            total: all.len() as u64,
            revisions,
        })
    }

    fn get_item_revision(&self, share_id: &str, item_id: &str) -> RemoteResult<ItemRevisionData> {
        let mut inner = self.lock();
        inner.calls.get_item_revision += 1;
        Self::check_available(&inner)?;
        inner
            .items
            .get(share_id)
            .and_then(|items| items.get(item_id))
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("item {}", item_id)))
    }

    fn update_item(
        &self,
        share_id: &str,
        item_id: &str,
        request: &UpdateItemRequest,
    ) -> RemoteResult<ItemRevisionData> {
        let mut inner = self.lock();
        inner.calls.update_item += 1;
        Self::check_available(&inner)?;
        let now = inner.tick();
        let items = inner
            .items
            .get_mut(share_id)
            .ok_or_else(|| RemoteError::NotFound(format!("share {}", share_id)))?;
        let current = items
            .get_mut(item_id)
            .ok_or_else(|| RemoteError::NotFound(format!("item {}", item_id)))?;

        if request.last_revision != current.revision {
            return Err(RemoteError::Stale {
                item_id: item_id.to_string(),
                current: current.revision,
            });
        }

        current.revision += 1;
        current.content = request.content.clone();
        current.content_format_version = request.content_format_version;
        current.key_rotation = request.key_rotation;
        current.modify_time = now;
        Ok(current.clone())
    }

    fn create_vault(&self, _user_id: &str, request: &CreateVaultRequest) -> RemoteResult<ShareData> {
        let mut inner = self.lock();
        Self::check_available(&inner)?;
        let now = inner.tick();
        let share_id = Uuid::new_v4().to_string();
        let share = ShareData {
            share_id: share_id.clone(),
            content: request.content.clone(),
            content_format_version: request.content_format_version,
            key_rotation: 1,
            create_time: now,
        };
        inner.shares.insert(share_id.clone(), share.clone());
        inner.keys.insert(
            share_id,
            vec![ShareKeyData {
                key_rotation: 1,
                key: request.encrypted_vault_key.clone(),
                valid_since: now,
            }],
        );
        Ok(share)
    }

    fn update_vault(&self, share_id: &str, request: &UpdateVaultRequest) -> RemoteResult<()> {
        let mut inner = self.lock();
        Self::check_available(&inner)?;
        let share = inner
            .shares
            .get_mut(share_id)
            .ok_or_else(|| RemoteError::NotFound(format!("share {}", share_id)))?;
        share.content = request.content.clone();
        share.content_format_version = request.content_format_version;
        share.key_rotation = request.key_rotation;
        Ok(())
    }

    fn transfer_ownership(&self, share_id: &str, new_owner_share_id: &str) -> RemoteResult<()> {
        let inner = self.lock();
        Self::check_available(&inner)?;
        for id in [share_id, new_owner_share_id] {
            if !inner.shares.contains_key(id) {
                return Err(RemoteError::NotFound(format!("share {}", id)));
            }
        }
        Ok(())
    }

    fn pin_item(&self, share_id: &str, item_id: &str) -> RemoteResult<()> {
        self.set_pin(share_id, item_id, true)
    }

    fn unpin_item(&self, share_id: &str, item_id: &str) -> RemoteResult<()> {
        self.set_pin(share_id, item_id, false)
    }

    fn delete_user_share(&self, share_id: &str, _user_id: &str) -> RemoteResult<()> {
        let mut inner = self.lock();
        Self::check_available(&inner)?;
        if inner.shares.remove(share_id).is_none() {
            return Err(RemoteError::NotFound(format!("share {}", share_id)));
        }
        inner.keys.remove(share_id);
        inner.items.remove(share_id);
        Ok(())
    }

    fn get_access(&self, user_id: &str) -> RemoteResult<PlanData> {
        let inner = self.lock();
        Self::check_available(&inner)?;
        inner
            .access
            .get(user_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("access for {}", user_id)))
    }
}

impl MockRemoteStore {
    fn set_pin(&self, share_id: &str, item_id: &str, pinned: bool) -> RemoteResult<()> {
        let mut inner = self.lock();
        Self::check_available(&inner)?;
        let item = inner
            .items
            .get_mut(share_id)
            .and_then(|items| items.get_mut(item_id))
            .ok_or_else(|| RemoteError::NotFound(format!("item {}", item_id)))?;
        item.pinned = pinned;
        Ok(())
    }
}
