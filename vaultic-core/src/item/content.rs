// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Item Content
//!
//! Closed set of item kinds with a versioned binary serialization
//! (bincode). The codec matches exhaustively on the enum; adding a kind is
//! a content-format change, not a runtime dispatch concern.

use serde::{Deserialize, Serialize};

/// Content format version stamped on every encrypted payload.
pub const CONTENT_FORMAT_VERSION: u32 = 1;

/// Lifecycle state of an item as tracked by the server.
///
/// Trash is modeled with this field, never with absence from the remote
/// revision list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemState {
    Active,
    Trashed,
}

impl ItemState {
    pub fn from_raw(raw: u32) -> Option<ItemState> {
        match raw {
            1 => Some(ItemState::Active),
            2 => Some(ItemState::Trashed),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u32 {
        match self {
            ItemState::Active => 1,
            ItemState::Trashed => 2,
        }
    }
}

/// The kind of an item, for presentation and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Login,
    Note,
    Alias,
    CreditCard,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ItemKind::Login => "login",
            ItemKind::Note => "note",
            ItemKind::Alias => "alias",
            ItemKind::CreditCard => "credit-card",
        };
        f.write_str(name)
    }
}

/// Decrypted item content.
///
/// Exists only transiently in memory; the cache stores it re-encrypted
/// under the master key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemContent {
    Login {
        title: String,
        username: String,
        password: String,
        urls: Vec<String>,
        totp_uri: Option<String>,
        note: String,
    },
    Note {
        title: String,
        text: String,
    },
    Alias {
        title: String,
        note: String,
    },
    CreditCard {
        title: String,
        cardholder: String,
        number: String,
        expiry: String,
        security_code: String,
        note: String,
    },
}

impl ItemContent {
    pub fn title(&self) -> &str {
        match self {
            ItemContent::Login { title, .. }
            | ItemContent::Note { title, .. }
            | ItemContent::Alias { title, .. }
            | ItemContent::CreditCard { title, .. } => title,
        }
    }

    /// Secondary presentation line, when the kind has one.
    pub fn subtitle(&self) -> Option<&str> {
        match self {
            ItemContent::Login { username, .. } => Some(username),
            ItemContent::Note { .. } => None,
            ItemContent::Alias { .. } => None,
            ItemContent::CreditCard { cardholder, .. } => Some(cardholder),
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ItemContent::Login { .. } => ItemKind::Login,
            ItemContent::Note { .. } => ItemKind::Note,
            ItemContent::Alias { .. } => ItemKind::Alias,
            ItemContent::CreditCard { .. } => ItemKind::CreditCard,
        }
    }

    pub fn is_login(&self) -> bool {
        matches!(self, ItemContent::Login { .. })
    }
}
