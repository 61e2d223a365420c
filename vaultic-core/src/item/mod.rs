// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Item Model & Codec
//!
//! Structured item content, server revisions, and the authenticated
//! encryption codec between them.

pub mod codec;
pub mod content;
pub mod revision;

pub use codec::{
    build_update_request, decrypt_content, decrypt_vault_meta, encrypt_content,
    encrypt_vault_meta, CodecError, UpdateItemRequest,
};
pub use content::{ItemContent, ItemKind, ItemState, CONTENT_FORMAT_VERSION};
pub use revision::{EncryptedItem, ItemRevision};
