// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sync Event System
//!
//! Observers receive one event per share summarizing a reconciliation
//! pass, plus an aggregate event per full cycle. Events carry an error
//! kind and ids only — never ciphertext or key material.

use std::sync::Arc;

/// Why an item was skipped during a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The content format version is newer than this client understands.
    UnsupportedFormat(u32),
    /// The payload failed to open or parse.
    Undecryptable,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnsupportedFormat(v) => write!(f, "unsupported content format {}", v),
            SkipReason::Undecryptable => write!(f, "undecryptable content"),
        }
    }
}

/// Counts of changes applied by a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
}

impl SyncSummary {
    pub fn merge(&mut self, other: &SyncSummary) {
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.deleted += other.deleted;
        self.skipped += other.skipped;
    }
}

/// Events emitted by the sync engine.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// A reconciliation pass started for a share.
    SyncStarted { share_id: String },

    /// A share finished reconciling.
    ShareSynced {
        share_id: String,
        summary: SyncSummary,
    },

    /// A reconciliation pass failed.
    SyncFailed {
        /// Absent for failures before any share was picked.
        share_id: Option<String>,
        /// Error kind and ids only; no payload data.
        error: String,
    },

    /// An item was skipped and reported rather than failing the pass.
    ItemSkipped {
        share_id: String,
        item_id: String,
        reason: SkipReason,
    },

    /// A full sync cycle finished, with aggregated counts.
    AllSynced { summary: SyncSummary },
}

/// Observer trait for sync events.
pub trait SyncObserver: Send + Sync {
    fn on_event(&self, event: SyncEvent);
}

/// Closure-based observer.
pub struct CallbackObserver<F>
where
    F: Fn(SyncEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackObserver<F>
where
    F: Fn(SyncEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        CallbackObserver { callback }
    }
}

impl<F> SyncObserver for CallbackObserver<F>
where
    F: Fn(SyncEvent) + Send + Sync,
{
    fn on_event(&self, event: SyncEvent) {
        (self.callback)(event);
    }
}

/// Fan-out dispatcher for sync events.
#[derive(Default)]
pub struct EventDispatcher {
    observers: Vec<Arc<dyn SyncObserver>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        EventDispatcher {
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn SyncObserver>) {
        self.observers.push(observer);
    }

    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn dispatch(&self, event: SyncEvent) {
        for observer in &self.observers {
            observer.on_event(event.clone());
        }
    }
}
