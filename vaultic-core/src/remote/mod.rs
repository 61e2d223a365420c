// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Remote Store
//!
//! Abstract interface over the revision-based server store, plus an
//! in-memory mock for tests. The wire transport itself lives outside this
//! crate.

pub mod mock;
pub mod store;

pub use mock::{CallCounts, MockRemoteStore};
pub use store::{
    CreateVaultRequest, ItemRevisionData, ItemRevisionsPage, RemoteError, RemoteResult,
    RemoteStore, ShareData, ShareKeyData, ShareKeysResponse, UpdateVaultRequest,
};
