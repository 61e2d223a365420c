// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Module
//!
//! Reconciliation of the local encrypted cache against the remote
//! revision-based store, vault mutations, and the event stream observers
//! subscribe to.

pub mod cancel;
pub mod engine;
pub mod events;
pub mod state;

mod vaults;

pub use cancel::CancellationToken;
pub use engine::SyncEngine;
pub use events::{
    CallbackObserver, EventDispatcher, SkipReason, SyncEvent, SyncObserver, SyncSummary,
};
pub use state::{RetryPolicy, SyncPhase};
