//! Sync State & Retry Policy
//!
//! Per-share reconciliation phase tracking and the backoff schedule for
//! whole-cycle retries.

use std::time::Duration;

/// Reconciliation phase of one `(user, share)` pair.
///
/// `Idle → Fetching → Diffing → Applying → Idle`, with `Failed` reachable
/// from any non-idle phase on unrecoverable error and `Cancelled` on
/// explicit stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Diffing,
    Applying,
    Failed,
    Cancelled,
}

/// Bounded whole-cycle retry with exponential backoff.
///
/// Applies only to transport failures; crypto and integrity errors are
/// never retried through this policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following `attempt` (zero-based).
    ///
    /// Exponential: 30s, 1m, 2m, 4m, ... capped at `base * 2^6`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * (1u32 << attempt.min(6))
    }
}
