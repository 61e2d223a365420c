// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Remote Store Interface
//!
//! The capability this engine consumes from the transport layer. All
//! calls are request/response; authentication, retries at the wire level,
//! and timeouts belong to the transport, which surfaces any failure here
//! as [`RemoteError::Unavailable`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::access::PlanData;
use crate::item::{ItemRevision, ItemState, UpdateItemRequest};

/// Remote store error types.
#[derive(Error, Debug, Clone)]
pub enum RemoteError {
    /// Transport-layer failure of any kind. The engine retries the whole
    /// sync cycle with backoff, bounded.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// Optimistic-concurrency conflict: the request carried a
    /// `last_revision` the server has already moved past.
    #[error("stale revision for item {item_id}: server is at {current}")]
    Stale { item_id: String, current: u64 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// A share key on the wire: sealed to the user's address key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareKeyData {
    pub key_rotation: u64,
    /// Base64 of the address-key envelope.
    pub key: String,
    pub valid_since: i64,
}

/// Response to a share key fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShareKeysResponse {
    pub vault_keys: Vec<ShareKeyData>,
    /// Per-item key envelopes; opaque to this client.
    pub item_keys: Vec<ShareKeyData>,
    pub total: u64,
}

/// A share on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareData {
    pub share_id: String,
    /// Base64 of the vault metadata sealed under the share key.
    pub content: String,
    pub content_format_version: u32,
    pub key_rotation: u64,
    pub create_time: i64,
}

/// An item revision on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRevisionData {
    pub item_id: String,
    pub revision: u64,
    pub content_format_version: u32,
    pub key_rotation: u64,
    /// Base64 of the sealed item content.
    pub content: String,
    pub item_key: Option<String>,
    pub state: u32,
    pub alias_email: Option<String>,
    pub pinned: bool,
    pub create_time: i64,
    pub modify_time: i64,
    pub last_use_time: Option<i64>,
}

impl TryFrom<ItemRevisionData> for ItemRevision {
    type Error = RemoteError;

    fn try_from(data: ItemRevisionData) -> Result<Self, RemoteError> {
        let content = BASE64
            .decode(&data.content)
            .map_err(|e| RemoteError::Malformed(format!("item {} content: {}", data.item_id, e)))?;
        let state = ItemState::from_raw(data.state).ok_or_else(|| {
            RemoteError::Malformed(format!("item {} state {}", data.item_id, data.state))
        })?;
        Ok(ItemRevision {
            item_id: data.item_id,
            revision: data.revision,
            content_format_version: data.content_format_version,
            key_rotation: data.key_rotation,
            content,
            item_key: data.item_key,
            state,
            alias_email: data.alias_email,
            pinned: data.pinned,
            create_time: data.create_time,
            modify_time: data.modify_time,
            last_use_time: data.last_use_time,
        })
    }
}

/// One page of a share's revision list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemRevisionsPage {
    pub total: u64,
    pub revisions: Vec<ItemRevisionData>,
}

/// Request to create a vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVaultRequest {
    /// Base64 of the vault metadata sealed under the new vault key.
    pub content: String,
    pub content_format_version: u32,
    /// Base64 of the vault key sealed to the creator's address key.
    pub encrypted_vault_key: String,
}

/// Request to update vault metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateVaultRequest {
    pub content: String,
    pub content_format_version: u32,
    pub key_rotation: u64,
}

/// The remote revision-based store, as consumed by the sync engine.
///
/// Implemented by the transport collaborator; [`MockRemoteStore`] backs
/// the tests.
///
/// [`MockRemoteStore`]: crate::remote::MockRemoteStore
pub trait RemoteStore: Send + Sync {
    /// Lists the user's shares.
    fn get_shares(&self, user_id: &str) -> RemoteResult<Vec<ShareData>>;

    /// Fetches the key set for a share.
    fn get_share_keys(&self, share_id: &str) -> RemoteResult<ShareKeysResponse>;

    /// Fetches one page of a share's revision list. Pages are zero-based.
    fn get_item_revisions(&self, share_id: &str, page: u32) -> RemoteResult<ItemRevisionsPage>;

    /// Fetches the current revision of a single item (targeted refetch).
    fn get_item_revision(&self, share_id: &str, item_id: &str) -> RemoteResult<ItemRevisionData>;

    /// Writes an item. Rejected with [`RemoteError::Stale`] when
    /// `last_revision` no longer matches the server's current revision.
    fn update_item(
        &self,
        share_id: &str,
        item_id: &str,
        request: &UpdateItemRequest,
    ) -> RemoteResult<ItemRevisionData>;

    /// Creates a vault; the server assigns the share id and rotation 1.
    fn create_vault(&self, user_id: &str, request: &CreateVaultRequest) -> RemoteResult<ShareData>;

    /// Updates vault metadata.
    fn update_vault(&self, share_id: &str, request: &UpdateVaultRequest) -> RemoteResult<()>;

    /// Transfers vault ownership to another share of the same vault.
    fn transfer_ownership(&self, share_id: &str, new_owner_share_id: &str) -> RemoteResult<()>;

    /// Pins an item.
    fn pin_item(&self, share_id: &str, item_id: &str) -> RemoteResult<()>;

    /// Unpins an item.
    fn unpin_item(&self, share_id: &str, item_id: &str) -> RemoteResult<()>;

    /// Removes a user's access to a share.
    fn delete_user_share(&self, share_id: &str, user_id: &str) -> RemoteResult<()>;

    /// Fetches the user's entitlement snapshot.
    fn get_access(&self, user_id: &str) -> RemoteResult<PlanData>;
}
