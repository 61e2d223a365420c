// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Reconciliation Engine
//!
//! Diffs the local encrypted cache against the remote revision-based
//! store and applies the minimal set of changes. Remote revisions are
//! authoritative: items present remotely but not locally are inserted,
//! higher remote revisions replace cached rows, and items gone from the
//! remote are deleted. Trash is a state field, never absence.
//!
//! Content is decrypted with the share key matching each revision's
//! rotation, then re-encrypted under the master key before touching the
//! cache. Items that cannot be decoded are skipped, counted, and
//! reported — a single undecryptable item never fails a pass, and a
//! corrupt row is never retried indefinitely.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::{debug, warn};

use crate::crypto::MasterKeyProvider;
use crate::error::{EngineError, EngineResult};
use crate::item::{
    build_update_request, codec, decrypt_content, CodecError, EncryptedItem, ItemContent,
    ItemRevision,
};
use crate::keys::{AddressKeyPair, KeyError, ShareKeyStore};
use crate::remote::{ItemRevisionData, RemoteError, RemoteStore, ShareData};
use crate::share::Share;
use crate::storage::Storage;

use super::cancel::CancellationToken;
use super::events::{EventDispatcher, SkipReason, SyncEvent, SyncSummary};
use super::state::{RetryPolicy, SyncPhase};

/// Rows committed to the cache per transaction during apply.
const APPLY_BATCH_SIZE: usize = 50;

/// Refetch-and-retry attempts after a stale write rejection.
const MAX_STALE_RETRIES: u32 = 2;

/// Per-user sync engine over one remote store and one local cache.
pub struct SyncEngine<'a, R: RemoteStore> {
    remote: R,
    storage: &'a Storage,
    keys: ShareKeyStore<'a>,
    address: Arc<AddressKeyPair>,
    events: Arc<EventDispatcher>,
    user_id: String,
    retry: RetryPolicy,
    phases: Mutex<HashMap<String, SyncPhase>>,
}

impl<'a, R: RemoteStore> SyncEngine<'a, R> {
    /// Creates an engine for one user session.
    ///
    /// The master key provider and address key pair are explicit handles;
    /// the engine holds no global state.
    pub fn new(
        remote: R,
        storage: &'a Storage,
        provider: Arc<MasterKeyProvider>,
        address: Arc<AddressKeyPair>,
        user_id: impl Into<String>,
        events: Arc<EventDispatcher>,
    ) -> Self {
        let keys = ShareKeyStore::new(storage, provider, Arc::clone(&address));
        SyncEngine {
            remote,
            storage,
            keys,
            address,
            events,
            user_id: user_id.into(),
            retry: RetryPolicy::default(),
            phases: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the whole-cycle retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Current reconciliation phase for a share.
    pub fn phase(&self, share_id: &str) -> SyncPhase {
        self.phases
            .lock()
            .expect("phase map lock poisoned")
            .get(share_id)
            .copied()
            .unwrap_or(SyncPhase::Idle)
    }

    /// The share key store backing this engine.
    pub fn keys(&self) -> &ShareKeyStore<'a> {
        &self.keys
    }

    /// The remote store backing this engine.
    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub(crate) fn storage(&self) -> &'a Storage {
        self.storage
    }

    /// The event dispatcher this engine reports through.
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub(crate) fn user_id(&self) -> &str {
        &self.user_id
    }

    pub(crate) fn address(&self) -> &AddressKeyPair {
        &self.address
    }

    // === Full cycle ===

    /// Runs a full sync cycle: share list reconciliation followed by a
    /// per-share item reconciliation pass.
    pub fn sync(&self, cancel: &CancellationToken) -> EngineResult<SyncSummary> {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let remote_shares = self.remote.get_shares(&self.user_id)?;
        let remote_ids: HashSet<&str> = remote_shares.iter().map(|s| s.share_id.as_str()).collect();

        // Shares gone remotely take their keys and items with them.
        for local in self.storage.get_all_shares(&self.user_id)? {
            if !remote_ids.contains(local.share_id.as_str()) {
                debug!(share_id = %local.share_id, "share removed remotely, dropping from cache");
                self.storage.remove_share(&local.share_id, &self.user_id)?;
                self.keys.forget_share(&local.share_id);
            }
        }

        let mut shares = Vec::new();
        for data in &remote_shares {
            if let Some(share) = self.decode_share(data)? {
                shares.push(share);
            }
        }
        self.storage.upsert_shares(&shares, &self.user_id)?;

        let mut total = SyncSummary::default();
        for share in &shares {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            total.merge(&self.sync_share(&share.share_id, cancel)?);
        }

        self.events.dispatch(SyncEvent::AllSynced { summary: total });
        Ok(total)
    }

    /// Runs full cycles until one succeeds, retrying transport failures
    /// with exponential backoff up to the policy's attempt bound.
    pub fn sync_with_retry(&self, cancel: &CancellationToken) -> EngineResult<SyncSummary> {
        let mut attempt = 0;
        loop {
            match self.sync(cancel) {
                Err(e) if Self::is_transport_failure(&e) => {
                    attempt += 1;
                    if attempt >= self.retry.max_attempts {
                        let error = EngineError::RemoteUnavailable { attempts: attempt };
                        self.events.dispatch(SyncEvent::SyncFailed {
                            share_id: None,
                            error: error.to_string(),
                        });
                        return Err(error);
                    }
                    warn!(attempt, "sync cycle hit transport failure, backing off");
                    std::thread::sleep(self.retry.delay(attempt - 1));
                }
                other => return other,
            }
        }
    }

    fn is_transport_failure(error: &EngineError) -> bool {
        matches!(
            error,
            EngineError::Remote(RemoteError::Unavailable(_))
                | EngineError::Key(KeyError::Remote(RemoteError::Unavailable(_)))
        )
    }

    // === Per-share reconciliation ===

    /// Reconciles one share, emitting a summary event on completion.
    pub fn sync_share(
        &self,
        share_id: &str,
        cancel: &CancellationToken,
    ) -> EngineResult<SyncSummary> {
        self.events.dispatch(SyncEvent::SyncStarted {
            share_id: share_id.to_string(),
        });

        match self.reconcile_share(share_id, cancel) {
            Ok(summary) => {
                self.set_phase(share_id, SyncPhase::Idle);
                self.events.dispatch(SyncEvent::ShareSynced {
                    share_id: share_id.to_string(),
                    summary,
                });
                Ok(summary)
            }
            Err(EngineError::Cancelled) => {
                self.set_phase(share_id, SyncPhase::Cancelled);
                Err(EngineError::Cancelled)
            }
            Err(e) => {
                self.set_phase(share_id, SyncPhase::Failed);
                self.events.dispatch(SyncEvent::SyncFailed {
                    share_id: Some(share_id.to_string()),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn reconcile_share(
        &self,
        share_id: &str,
        cancel: &CancellationToken,
    ) -> EngineResult<SyncSummary> {
        let mut summary = SyncSummary::default();

        // Fetch the full remote revision list, page by page.
        self.set_phase(share_id, SyncPhase::Fetching);
        let mut remote_revisions: Vec<ItemRevisionData> = Vec::new();
        let mut page = 0u32;
        loop {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let batch = self.remote.get_item_revisions(share_id, page)?;
            let fetched = batch.revisions.len();
            remote_revisions.extend(batch.revisions);
            if fetched == 0 || remote_revisions.len() as u64 >= batch.total {
                break;
            }
            page += 1;
        }

        // Diff against the cache by item id.
        self.set_phase(share_id, SyncPhase::Diffing);
        let local = self.storage.get_items(&self.user_id, share_id)?;
        let local_revisions: HashMap<&str, u64> = local
            .iter()
            .map(|i| (i.revision.item_id.as_str(), i.revision.revision))
            .collect();
        let remote_ids: HashSet<&str> =
            remote_revisions.iter().map(|r| r.item_id.as_str()).collect();

        let mut to_apply: Vec<(&ItemRevisionData, bool)> = Vec::new();
        for data in &remote_revisions {
            match local_revisions.get(data.item_id.as_str()) {
                None => to_apply.push((data, true)),
                Some(&local_revision) if data.revision > local_revision => {
                    to_apply.push((data, false))
                }
                Some(_) => {}
            }
        }
        let to_delete: Vec<String> = local
            .iter()
            .filter(|i| !remote_ids.contains(i.revision.item_id.as_str()))
            .map(|i| i.revision.item_id.clone())
            .collect();

        // Apply in batches, checking the token before every commit.
        self.set_phase(share_id, SyncPhase::Applying);
        let mut batch: Vec<EncryptedItem> = Vec::new();
        let mut batch_inserted = 0usize;
        let mut batch_updated = 0usize;
        for (data, is_insert) in to_apply {
            match self.prepare_cache_row(share_id, data)? {
                Ok(row) => {
                    batch.push(row);
                    if is_insert {
                        batch_inserted += 1;
                    } else {
                        batch_updated += 1;
                    }
                }
                Err(reason) => {
                    summary.skipped += 1;
                    warn!(share_id, item_id = %data.item_id, %reason, "skipping item");
                    self.events.dispatch(SyncEvent::ItemSkipped {
                        share_id: share_id.to_string(),
                        item_id: data.item_id.clone(),
                        reason,
                    });
                }
            }

            if batch.len() >= APPLY_BATCH_SIZE {
                if cancel.is_cancelled() {
                    return Err(EngineError::Cancelled);
                }
                self.storage.upsert_items(&batch, &self.user_id)?;
                summary.inserted += batch_inserted;
                summary.updated += batch_updated;
                batch.clear();
                batch_inserted = 0;
                batch_updated = 0;
            }
        }

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        if !batch.is_empty() {
            self.storage.upsert_items(&batch, &self.user_id)?;
            summary.inserted += batch_inserted;
            summary.updated += batch_updated;
        }
        if !to_delete.is_empty() {
            summary.deleted += self
                .storage
                .remove_items(&self.user_id, share_id, &to_delete)?;
        }

        Ok(summary)
    }

    /// Decrypts a remote revision and re-encrypts it for the cache.
    ///
    /// Returns `Ok(Err(reason))` for per-item conditions that are skipped
    /// and reported; hard failures (no session key, storage, transport)
    /// propagate as errors.
    fn prepare_cache_row(
        &self,
        share_id: &str,
        data: &ItemRevisionData,
    ) -> EngineResult<Result<EncryptedItem, SkipReason>> {
        let revision = match ItemRevision::try_from(data.clone()) {
            Ok(revision) => revision,
            Err(RemoteError::Malformed(_)) => return Ok(Err(SkipReason::Undecryptable)),
            Err(e) => return Err(e.into()),
        };

        let key = match self.keys.key_for_rotation(
            &self.user_id,
            share_id,
            revision.key_rotation,
            &self.remote,
        ) {
            Ok(key) => key,
            Err(KeyError::RotationNotFound { .. }) | Err(KeyError::MissingKeys(_)) => {
                return Ok(Err(SkipReason::Undecryptable));
            }
            Err(e) => return Err(e.into()),
        };

        let content =
            match decrypt_content(&revision.content, &key, revision.content_format_version) {
                Ok(content) => content,
                Err(CodecError::UnsupportedFormat(version)) => {
                    return Ok(Err(SkipReason::UnsupportedFormat(version)));
                }
                Err(CodecError::Crypto(_)) | Err(CodecError::Serialization(_)) => {
                    return Ok(Err(SkipReason::Undecryptable));
                }
            };

        let encrypted_content = self.storage.encrypt_item_content(&content)?;
        Ok(Ok(EncryptedItem {
            share_id: share_id.to_string(),
            revision: revision.without_content(),
            encrypted_content,
            is_login_item: content.is_login(),
        }))
    }

    fn decode_share(&self, data: &ShareData) -> EngineResult<Option<Share>> {
        let sealed = match BASE64.decode(&data.content) {
            Ok(sealed) => sealed,
            Err(e) => {
                warn!(share_id = %data.share_id, %e, "skipping share with malformed content");
                return Ok(None);
            }
        };

        let key = match self.keys.key_for_rotation(
            &self.user_id,
            &data.share_id,
            data.key_rotation,
            &self.remote,
        ) {
            Ok(key) => key,
            Err(KeyError::RotationNotFound { .. }) | Err(KeyError::MissingKeys(_)) => {
                warn!(share_id = %data.share_id, "skipping share with no usable key");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match codec::decrypt_vault_meta(&sealed, key.key(), data.content_format_version) {
            Ok(meta) => Ok(Some(Share {
                share_id: data.share_id.clone(),
                meta,
                content_format_version: data.content_format_version,
                key_rotation: data.key_rotation,
                create_time: data.create_time,
            })),
            Err(e) => {
                warn!(share_id = %data.share_id, %e, "skipping undecodable share metadata");
                Ok(None)
            }
        }
    }

    // === Write path ===

    /// Writes new content for an item with optimistic concurrency.
    ///
    /// A stale rejection triggers a targeted refetch of that single item
    /// and a bounded retry; exhausting the bound surfaces
    /// [`EngineError::StaleRevision`]. Never a full resync.
    pub fn update_item(
        &self,
        share_id: &str,
        item_id: &str,
        new_content: &ItemContent,
    ) -> EngineResult<ItemRevision> {
        let cached = self
            .storage
            .get_item(&self.user_id, share_id, item_id)?
            .ok_or_else(|| EngineError::ItemNotFound {
                share_id: share_id.to_string(),
                item_id: item_id.to_string(),
            })?;

        let mut last_observed = cached.revision;
        let mut refetches = 0u32;
        loop {
            let key = self
                .keys
                .latest_for_share(&self.user_id, share_id, &self.remote)?;
            let request = build_update_request(&last_observed, &key, new_content)?;

            match self.remote.update_item(share_id, item_id, &request) {
                Ok(data) => {
                    let revision = ItemRevision::try_from(data)?;
                    let encrypted_content = self.storage.encrypt_item_content(new_content)?;
                    let row = EncryptedItem {
                        share_id: share_id.to_string(),
                        revision: revision.without_content(),
                        encrypted_content,
                        is_login_item: new_content.is_login(),
                    };
                    self.storage
                        .upsert_items(std::slice::from_ref(&row), &self.user_id)?;
                    return Ok(revision);
                }
                Err(RemoteError::Stale { .. }) if refetches < MAX_STALE_RETRIES => {
                    refetches += 1;
                    debug!(share_id, item_id, refetches, "stale write, refetching item");
                    let fresh = self.remote.get_item_revision(share_id, item_id)?;
                    last_observed = ItemRevision::try_from(fresh)?;
                }
                Err(RemoteError::Stale { .. }) => {
                    return Err(EngineError::StaleRevision {
                        share_id: share_id.to_string(),
                        item_id: item_id.to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Targeted refetch-and-replace of a single corrupted cache row.
    pub fn repair_item(&self, share_id: &str, item_id: &str) -> EngineResult<()> {
        let data = self.remote.get_item_revision(share_id, item_id)?;
        match self.prepare_cache_row(share_id, &data)? {
            Ok(row) => {
                self.storage
                    .upsert_items(std::slice::from_ref(&row), &self.user_id)?;
                Ok(())
            }
            Err(SkipReason::UnsupportedFormat(version)) => {
                Err(CodecError::UnsupportedFormat(version).into())
            }
            Err(SkipReason::Undecryptable) => Err(EngineError::Crypto(
                crate::crypto::EncryptionError::DecryptionFailed,
            )),
        }
    }

    /// Records a local use of an item (autofill, copy), feeding the
    /// recency ordering of search results.
    pub fn record_item_use(
        &self,
        share_id: &str,
        item_id: &str,
        used_at: i64,
    ) -> EngineResult<bool> {
        Ok(self
            .storage
            .update_last_use_time(&self.user_id, share_id, item_id, used_at)?)
    }

    fn set_phase(&self, share_id: &str, phase: SyncPhase) {
        self.phases
            .lock()
            .expect("phase map lock poisoned")
            .insert(share_id.to_string(), phase);
    }
}
