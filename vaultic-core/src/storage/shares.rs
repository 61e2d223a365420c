// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Share and share-key cache operations.

use rusqlite::params;

use super::{Storage, StorageError};
use crate::crypto::{self, EncryptionDomain};
use crate::keys::EncryptedShareKey;
use crate::share::{Share, VaultMetadata};

struct ShareRow {
    share_id: String,
    meta_encrypted: Vec<u8>,
    content_format_version: u32,
    key_rotation: u64,
    create_time: i64,
}

impl Storage {
    // === Share Operations ===

    /// Inserts or replaces shares, keyed by `(user_id, share_id)`.
    ///
    /// Idempotent: re-applying the same batch leaves a single row per
    /// share. All rows apply in one transaction, or none do.
    pub fn upsert_shares(&self, shares: &[Share], user_id: &str) -> Result<(), StorageError> {
        let master = self.master_key()?;
        let tx = self.conn().unchecked_transaction()?;
        for share in shares {
            let meta_json = serde_json::to_vec(&share.meta)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            let meta_encrypted = crypto::encrypt(&master, &meta_json, EncryptionDomain::CacheRow)
                .map_err(|e| StorageError::Encryption(e.to_string()))?;

            tx.execute(
                "INSERT OR REPLACE INTO shares
                 (user_id, share_id, meta_encrypted, content_format_version,
                  key_rotation, create_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user_id,
                    share.share_id,
                    meta_encrypted,
                    share.content_format_version,
                    share.key_rotation as i64,
                    share.create_time,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Loads a share by id.
    pub fn get_share(&self, user_id: &str, share_id: &str) -> Result<Option<Share>, StorageError> {
        let mut stmt = self.conn().prepare(
            "SELECT share_id, meta_encrypted, content_format_version, key_rotation, create_time
             FROM shares WHERE user_id = ?1 AND share_id = ?2",
        )?;

        let result = stmt.query_row(params![user_id, share_id], |row| {
            Ok(ShareRow {
                share_id: row.get(0)?,
                meta_encrypted: row.get(1)?,
                content_format_version: row.get(2)?,
                key_rotation: row.get::<_, i64>(3)? as u64,
                create_time: row.get(4)?,
            })
        });

        match result {
            Ok(row) => Ok(Some(self.row_to_share(row)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    /// Lists all shares for a user, newest first.
    pub fn get_all_shares(&self, user_id: &str) -> Result<Vec<Share>, StorageError> {
        let mut stmt = self.conn().prepare(
            "SELECT share_id, meta_encrypted, content_format_version, key_rotation, create_time
             FROM shares WHERE user_id = ?1 ORDER BY create_time DESC",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(ShareRow {
                share_id: row.get(0)?,
                meta_encrypted: row.get(1)?,
                content_format_version: row.get(2)?,
                key_rotation: row.get::<_, i64>(3)? as u64,
                create_time: row.get(4)?,
            })
        })?;

        let mut shares = Vec::new();
        for row_result in rows {
            shares.push(self.row_to_share(row_result?)?);
        }
        Ok(shares)
    }

    /// Removes a share and everything scoped to it: keys and items.
    pub fn remove_share(&self, share_id: &str, user_id: &str) -> Result<bool, StorageError> {
        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "DELETE FROM items WHERE user_id = ?1 AND share_id = ?2",
            params![user_id, share_id],
        )?;
        tx.execute(
            "DELETE FROM share_keys WHERE user_id = ?1 AND share_id = ?2",
            params![user_id, share_id],
        )?;
        let removed = tx.execute(
            "DELETE FROM shares WHERE user_id = ?1 AND share_id = ?2",
            params![user_id, share_id],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    /// Removes every share for a user (full cache wipe for that user).
    pub fn remove_all_shares(&self, user_id: &str) -> Result<(), StorageError> {
        let tx = self.conn().unchecked_transaction()?;
        tx.execute("DELETE FROM items WHERE user_id = ?1", params![user_id])?;
        tx.execute("DELETE FROM share_keys WHERE user_id = ?1", params![user_id])?;
        tx.execute("DELETE FROM shares WHERE user_id = ?1", params![user_id])?;
        tx.commit()?;
        Ok(())
    }

    // === Share Key Operations ===

    /// Loads the wrapped key set for a share, rotation ascending.
    pub fn share_keys_for(
        &self,
        user_id: &str,
        share_id: &str,
    ) -> Result<Vec<EncryptedShareKey>, StorageError> {
        let mut stmt = self.conn().prepare(
            "SELECT share_id, key_rotation, valid_since, encrypted_key
             FROM share_keys WHERE user_id = ?1 AND share_id = ?2
             ORDER BY key_rotation ASC",
        )?;

        let rows = stmt.query_map(params![user_id, share_id], |row| {
            Ok(EncryptedShareKey {
                share_id: row.get(0)?,
                key_rotation: row.get::<_, i64>(1)? as u64,
                valid_since: row.get(2)?,
                encrypted_key: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StorageError::Database)
    }

    /// Inserts or replaces wrapped share keys.
    pub fn upsert_share_keys(
        &self,
        keys: &[EncryptedShareKey],
        user_id: &str,
    ) -> Result<(), StorageError> {
        let tx = self.conn().unchecked_transaction()?;
        for key in keys {
            tx.execute(
                "INSERT OR REPLACE INTO share_keys
                 (user_id, share_id, key_rotation, valid_since, encrypted_key)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user_id,
                    key.share_id,
                    key.key_rotation as i64,
                    key.valid_since,
                    key.encrypted_key,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn row_to_share(&self, row: ShareRow) -> Result<Share, StorageError> {
        let master = self.master_key()?;
        let meta_json = crypto::decrypt(&master, &row.meta_encrypted, EncryptionDomain::CacheRow)
            .map_err(|_| StorageError::CorruptedRecord {
            share_id: row.share_id.clone(),
            item_id: None,
        })?;
        let meta: VaultMetadata = serde_json::from_slice(&meta_json)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        Ok(Share {
            share_id: row.share_id,
            meta,
            content_format_version: row.content_format_version,
            key_rotation: row.key_rotation,
            create_time: row.create_time,
        })
    }
}
