// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Access snapshot cache operations.

use rusqlite::params;

use super::{Storage, StorageError};
use crate::access::Plan;
use crate::crypto::{self, EncryptionDomain};

impl Storage {
    /// Stores the entitlement snapshot for a user.
    pub fn upsert_access(
        &self,
        plan: &Plan,
        user_id: &str,
        refreshed_at: i64,
    ) -> Result<(), StorageError> {
        let master = self.master_key()?;
        let plan_json =
            serde_json::to_vec(plan).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let plan_encrypted = crypto::encrypt(&master, &plan_json, EncryptionDomain::CacheRow)
            .map_err(|e| StorageError::Encryption(e.to_string()))?;

        self.conn().execute(
            "INSERT OR REPLACE INTO access (user_id, plan_encrypted, refreshed_at)
             VALUES (?1, ?2, ?3)",
            params![user_id, plan_encrypted, refreshed_at],
        )?;
        Ok(())
    }

    /// Loads the cached entitlement snapshot, if any.
    pub fn get_access(&self, user_id: &str) -> Result<Option<Plan>, StorageError> {
        let result: Result<Vec<u8>, _> = self.conn().query_row(
            "SELECT plan_encrypted FROM access WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        );

        let plan_encrypted = match result {
            Ok(blob) => blob,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(StorageError::Database(e)),
        };

        let master = self.master_key()?;
        let plan_json = crypto::decrypt(&master, &plan_encrypted, EncryptionDomain::CacheRow)
            .map_err(|e| StorageError::Encryption(e.to_string()))?;
        let plan: Plan = serde_json::from_slice(&plan_json)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(plan))
    }
}
