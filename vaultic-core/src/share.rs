// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Shares
//!
//! A share is a vault: the unit of key rotation and access control. Items
//! belong to exactly one share, and every cache query is scoped by
//! `(user_id, share_id)`.

use serde::{Deserialize, Serialize};

/// Decrypted vault metadata.
///
/// Sealed in the vault-content domain on the wire; held in plaintext only
/// transiently in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultMetadata {
    pub name: String,
    pub description: String,
}

impl VaultMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        VaultMetadata {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// A share as held in memory: identity, decrypted metadata, and the
/// rotation its metadata was sealed with.
#[derive(Debug, Clone, PartialEq)]
pub struct Share {
    pub share_id: String,
    pub meta: VaultMetadata,
    pub content_format_version: u32,
    pub key_rotation: u64,
    pub create_time: i64,
}
