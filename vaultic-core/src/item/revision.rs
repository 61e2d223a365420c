// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Item Revisions
//!
//! A new revision is created server-side on every mutating write. Revision
//! numbers are monotonic per item and act as optimistic-concurrency
//! tokens: a write carries the last revision the client observed and is
//! rejected when it no longer matches.

use serde::{Deserialize, Serialize};

use super::content::ItemState;

/// One server-issued revision of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRevision {
    pub item_id: String,
    pub revision: u64,
    pub content_format_version: u32,
    pub key_rotation: u64,
    /// Ciphertext as fetched from the remote. Cleared before caching; the
    /// cache row keeps content re-encrypted under the master key instead.
    pub content: Vec<u8>,
    /// Per-item key envelope issued by the server; opaque to this client.
    pub item_key: Option<String>,
    pub state: ItemState,
    pub alias_email: Option<String>,
    pub pinned: bool,
    pub create_time: i64,
    pub modify_time: i64,
    pub last_use_time: Option<i64>,
}

impl ItemRevision {
    /// Ranking timestamp for recency ordering: the later of last use and
    /// last modification.
    pub fn ranking_time(&self) -> i64 {
        self.last_use_time.unwrap_or(0).max(self.modify_time)
    }

    /// Copy with the remote ciphertext dropped, as stored in the cache.
    pub fn without_content(&self) -> ItemRevision {
        ItemRevision {
            content: Vec::new(),
            ..self.clone()
        }
    }
}

/// Local cache row: revision metadata plus content re-encrypted under the
/// master key. Never contains plaintext or remote ciphertext.
#[derive(Debug, Clone)]
pub struct EncryptedItem {
    pub share_id: String,
    pub revision: ItemRevision,
    pub encrypted_content: Vec<u8>,
    pub is_login_item: bool,
}
