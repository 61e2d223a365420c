// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Engine Error Types
//!
//! Unified error surface for the sync engine. Messages carry an error
//! kind plus ids for diagnostics — never ciphertext or key material.

use thiserror::Error;

use crate::crypto::EncryptionError;
use crate::item::CodecError;
use crate::keys::KeyError;
use crate::remote::RemoteError;
use crate::storage::StorageError;

/// Unified error type for engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Key management failed.
    #[error("key error: {0}")]
    Key(#[from] KeyError),

    /// Seal or open operation failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] EncryptionError),

    /// Content encoding or format dispatch failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Cache operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Remote store call failed.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Transport stayed down through every bounded retry of the cycle.
    #[error("remote store unavailable after {attempts} attempts")]
    RemoteUnavailable { attempts: u32 },

    /// Optimistic-concurrency conflict that survived the bounded
    /// refetch-and-retry.
    #[error("stale revision for item {item_id} in share {share_id}")]
    StaleRevision { share_id: String, item_id: String },

    /// Item missing from the local cache.
    #[error("item {item_id} not found in share {share_id}")]
    ItemNotFound { share_id: String, item_id: String },

    /// Share missing from the local cache.
    #[error("share {share_id} not found")]
    ShareNotFound { share_id: String },

    /// Operation stopped by its cancellation token.
    #[error("sync cancelled")]
    Cancelled,
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
