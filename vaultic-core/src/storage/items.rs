// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Item cache operations.
//!
//! Rows are keyed by `(user_id, share_id, item_id)` and carry content
//! re-encrypted under the master key. Upserts are guarded by revision:
//! a row can only be replaced by an equal or higher revision, so retried
//! or out-of-order deliveries never overwrite newer cached state.

use rusqlite::{params, Row};

use super::{Storage, StorageError};
use crate::crypto::{self, EncryptionDomain};
use crate::item::{EncryptedItem, ItemContent, ItemRevision, ItemState};

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<EncryptedItem> {
    let state_raw: u32 = row.get(8)?;
    let revision = ItemRevision {
        item_id: row.get(1)?,
        revision: row.get::<_, i64>(2)? as u64,
        content_format_version: row.get(3)?,
        key_rotation: row.get::<_, i64>(4)? as u64,
        content: Vec::new(),
        item_key: row.get(6)?,
        state: ItemState::from_raw(state_raw).unwrap_or(ItemState::Active),
        alias_email: row.get(9)?,
        pinned: row.get::<_, i64>(10)? != 0,
        create_time: row.get(11)?,
        modify_time: row.get(12)?,
        last_use_time: row.get(13)?,
    };
    Ok(EncryptedItem {
        share_id: row.get(0)?,
        revision,
        encrypted_content: row.get(5)?,
        is_login_item: row.get::<_, i64>(7)? != 0,
    })
}

const ITEM_COLUMNS: &str = "share_id, item_id, revision, content_format_version, key_rotation,
     encrypted_content, item_key, is_login_item, state, alias_email, pinned,
     create_time, modify_time, last_use_time";

impl Storage {
    // === Item Operations ===

    /// Inserts or replaces items in a single transaction.
    ///
    /// A row only replaces an existing one when its revision is equal or
    /// higher; stale rows are skipped. Returns the number of rows applied.
    pub fn upsert_items(&self, items: &[EncryptedItem], user_id: &str) -> Result<usize, StorageError> {
        let tx = self.conn().unchecked_transaction()?;
        let mut applied = 0;
        for item in items {
            let rev = &item.revision;
            applied += tx.execute(
                "INSERT INTO items
                 (user_id, share_id, item_id, revision, content_format_version,
                  key_rotation, encrypted_content, item_key, state, alias_email,
                  pinned, is_login_item, create_time, modify_time, last_use_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                 ON CONFLICT(user_id, share_id, item_id) DO UPDATE SET
                   revision = excluded.revision,
                   content_format_version = excluded.content_format_version,
                   key_rotation = excluded.key_rotation,
                   encrypted_content = excluded.encrypted_content,
                   item_key = excluded.item_key,
                   state = excluded.state,
                   alias_email = excluded.alias_email,
                   pinned = excluded.pinned,
                   is_login_item = excluded.is_login_item,
                   create_time = excluded.create_time,
                   modify_time = excluded.modify_time,
                   last_use_time = excluded.last_use_time
                 WHERE excluded.revision >= items.revision",
                params![
                    user_id,
                    item.share_id,
                    rev.item_id,
                    rev.revision as i64,
                    rev.content_format_version,
                    rev.key_rotation as i64,
                    item.encrypted_content,
                    rev.item_key,
                    rev.state.as_raw(),
                    rev.alias_email,
                    rev.pinned as i64,
                    item.is_login_item as i64,
                    rev.create_time,
                    rev.modify_time,
                    rev.last_use_time,
                ],
            )?;
        }
        tx.commit()?;
        Ok(applied)
    }

    /// Loads a single item.
    pub fn get_item(
        &self,
        user_id: &str,
        share_id: &str,
        item_id: &str,
    ) -> Result<Option<EncryptedItem>, StorageError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE user_id = ?1 AND share_id = ?2 AND item_id = ?3"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let result = stmt.query_row(params![user_id, share_id, item_id], |row| {
            row_to_item(row)
        });

        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StorageError::Database(e)),
        }
    }

    /// Lists all items in a share.
    pub fn get_items(&self, user_id: &str, share_id: &str) -> Result<Vec<EncryptedItem>, StorageError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE user_id = ?1 AND share_id = ?2 ORDER BY item_id"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![user_id, share_id], |row| {
            row_to_item(row)
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StorageError::Database)
    }

    /// Lists all items across every share for a user.
    pub fn get_all_items(&self, user_id: &str) -> Result<Vec<EncryptedItem>, StorageError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE user_id = ?1 ORDER BY share_id, item_id"
        );
        let mut stmt = self.conn().prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], |row| {
            row_to_item(row)
        })?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StorageError::Database)
    }

    /// Removes the listed items in a single transaction.
    pub fn remove_items(
        &self,
        user_id: &str,
        share_id: &str,
        item_ids: &[String],
    ) -> Result<usize, StorageError> {
        let tx = self.conn().unchecked_transaction()?;
        let mut removed = 0;
        for item_id in item_ids {
            removed += tx.execute(
                "DELETE FROM items WHERE user_id = ?1 AND share_id = ?2 AND item_id = ?3",
                params![user_id, share_id, item_id],
            )?;
        }
        tx.commit()?;
        Ok(removed)
    }

    /// Removes every item in a share.
    pub fn remove_all_items(&self, user_id: &str, share_id: &str) -> Result<(), StorageError> {
        self.conn().execute(
            "DELETE FROM items WHERE user_id = ?1 AND share_id = ?2",
            params![user_id, share_id],
        )?;
        Ok(())
    }

    /// Records a local use of an item (autofill, copy).
    pub fn update_last_use_time(
        &self,
        user_id: &str,
        share_id: &str,
        item_id: &str,
        last_use_time: i64,
    ) -> Result<bool, StorageError> {
        let changed = self.conn().execute(
            "UPDATE items SET last_use_time = ?4
             WHERE user_id = ?1 AND share_id = ?2 AND item_id = ?3",
            params![user_id, share_id, item_id, last_use_time],
        )?;
        Ok(changed > 0)
    }

    /// Sets the local pinned flag after a server acknowledgment.
    pub fn set_pinned(
        &self,
        user_id: &str,
        share_id: &str,
        item_id: &str,
        pinned: bool,
    ) -> Result<bool, StorageError> {
        let changed = self.conn().execute(
            "UPDATE items SET pinned = ?4
             WHERE user_id = ?1 AND share_id = ?2 AND item_id = ?3",
            params![user_id, share_id, item_id, pinned as i64],
        )?;
        Ok(changed > 0)
    }

    /// Decrypts a cached item's content with the master key.
    ///
    /// A payload that fails to decrypt is a detected-corruption condition,
    /// surfaced as [`StorageError::CorruptedRecord`].
    pub fn decrypt_item_content(&self, item: &EncryptedItem) -> Result<ItemContent, StorageError> {
        let master = self.master_key()?;
        let plaintext =
            crypto::decrypt(&master, &item.encrypted_content, EncryptionDomain::CacheRow).map_err(
                |_| StorageError::CorruptedRecord {
                    share_id: item.share_id.clone(),
                    item_id: Some(item.revision.item_id.clone()),
                },
            )?;
        bincode::deserialize(&plaintext).map_err(|_| StorageError::CorruptedRecord {
            share_id: item.share_id.clone(),
            item_id: Some(item.revision.item_id.clone()),
        })
    }

    /// Seals item content under the master key for caching.
    pub fn encrypt_item_content(&self, content: &ItemContent) -> Result<Vec<u8>, StorageError> {
        let master = self.master_key()?;
        let plaintext =
            bincode::serialize(content).map_err(|e| StorageError::Serialization(e.to_string()))?;
        crypto::encrypt(&master, &plaintext, EncryptionDomain::CacheRow)
            .map_err(|e| StorageError::Encryption(e.to_string()))
    }
}
