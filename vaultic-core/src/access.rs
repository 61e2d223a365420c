// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Access & Plan
//!
//! Per-user entitlement snapshot. Refreshed from the server and cached
//! locally; never mutated by item or share logic. On the wire a limit of
//! `-1` means unlimited, which the domain model represents as an absent
//! limit.

use serde::{Deserialize, Serialize};

/// Entitlement snapshot in domain form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub vault_limit: Option<u32>,
    pub alias_limit: Option<u32>,
    pub totp_limit: Option<u32>,
    pub trial_end: Option<i64>,
}

impl Plan {
    /// Whether the plan allows another vault given the current count.
    pub fn allows_vault(&self, current_vaults: usize) -> bool {
        match self.vault_limit {
            Some(limit) => current_vaults < limit as usize,
            None => true,
        }
    }
}

/// Entitlement snapshot as delivered by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanData {
    pub name: String,
    pub vault_limit: i64,
    pub alias_limit: i64,
    pub totp_limit: i64,
    pub trial_end: i64,
}

impl From<PlanData> for Plan {
    fn from(data: PlanData) -> Self {
        Plan {
            name: data.name,
            vault_limit: limit(data.vault_limit),
            alias_limit: limit(data.alias_limit),
            totp_limit: limit(data.totp_limit),
            trial_end: (data.trial_end > 0).then_some(data.trial_end),
        }
    }
}

fn limit(raw: i64) -> Option<u32> {
    (raw >= 0).then(|| raw as u32)
}
