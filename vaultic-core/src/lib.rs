// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Vaultic Core Library
//!
//! End-to-end encrypted password manager core: per-vault key management
//! and rotation, item encryption, a local encrypted cache, reconciliation
//! against a remote revision-based store, and search projections over
//! decrypted data. Decrypted material exists only transiently in memory;
//! nothing is persisted in plaintext.

pub mod access;
pub mod crypto;
pub mod error;
pub mod item;
pub mod keys;
pub mod remote;
pub mod search;
pub mod share;
pub mod storage;
pub mod sync;

pub use access::{Plan, PlanData};
pub use crypto::{EncryptionDomain, EncryptionError, KeyUnavailable, MasterKeyProvider, SymmetricKey};
pub use error::{EngineError, EngineResult};
pub use item::{
    ItemContent, ItemKind, ItemRevision, ItemState, UpdateItemRequest, CONTENT_FORMAT_VERSION,
};
pub use keys::{select_latest, AddressKeyPair, EncryptedShareKey, KeyError, ShareKey, ShareKeyStore};
pub use remote::{MockRemoteStore, RemoteError, RemoteStore};
pub use search::{HighlightedText, ItemSearchResult, ItemSearcher, SearchReport, SearchSort};
pub use share::{Share, VaultMetadata};
pub use storage::{Storage, StorageError};
pub use sync::{
    CancellationToken, EventDispatcher, RetryPolicy, SkipReason, SyncEngine, SyncEvent,
    SyncObserver, SyncPhase, SyncSummary,
};
