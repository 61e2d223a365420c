// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Database Schema Migration Framework
//!
//! Versioned schema migrations with transactional safety. Each migration
//! has a version number, a name, and either SQL or a Rust callback. The
//! runner tracks applied versions in a `schema_version` table and runs
//! pending migrations in order within a single transaction.

use rusqlite::Connection;

use super::StorageError;

/// A single schema migration step.
pub struct Migration {
    /// Monotonically increasing version number (starting at 1).
    pub version: u32,
    /// Human-readable name for this migration.
    pub name: &'static str,
    /// The migration action: either SQL or a Rust callback.
    pub action: MigrationAction,
}

/// The action a migration performs.
pub enum MigrationAction {
    /// Pure SQL migration.
    Sql(&'static str),
    /// Rust callback migration (for data transformations).
    Callback(fn(&Connection) -> Result<(), StorageError>),
}

/// All migrations, in order.
pub fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        name: "initial schema",
        action: MigrationAction::Sql(
            "CREATE TABLE shares (
                user_id TEXT NOT NULL,
                share_id TEXT NOT NULL,
                meta_encrypted BLOB NOT NULL,
                content_format_version INTEGER NOT NULL,
                key_rotation INTEGER NOT NULL,
                create_time INTEGER NOT NULL,
                PRIMARY KEY (user_id, share_id)
            );
            CREATE TABLE share_keys (
                user_id TEXT NOT NULL,
                share_id TEXT NOT NULL,
                key_rotation INTEGER NOT NULL,
                valid_since INTEGER NOT NULL,
                encrypted_key BLOB NOT NULL,
                PRIMARY KEY (user_id, share_id, key_rotation)
            );
            CREATE TABLE items (
                user_id TEXT NOT NULL,
                share_id TEXT NOT NULL,
                item_id TEXT NOT NULL,
                revision INTEGER NOT NULL,
                content_format_version INTEGER NOT NULL,
                key_rotation INTEGER NOT NULL,
                encrypted_content BLOB NOT NULL,
                item_key TEXT,
                state INTEGER NOT NULL,
                alias_email TEXT,
                pinned INTEGER NOT NULL DEFAULT 0,
                is_login_item INTEGER NOT NULL,
                create_time INTEGER NOT NULL,
                modify_time INTEGER NOT NULL,
                last_use_time INTEGER,
                PRIMARY KEY (user_id, share_id, item_id)
            );
            CREATE INDEX idx_items_user_share ON items(user_id, share_id);
            CREATE TABLE access (
                user_id TEXT PRIMARY KEY,
                plan_encrypted BLOB NOT NULL,
                refreshed_at INTEGER NOT NULL
            );",
        ),
    }]
}

/// Runs schema migrations against a database connection.
pub struct MigrationRunner;

impl MigrationRunner {
    /// Runs all pending migrations in a transaction.
    ///
    /// Creates the `schema_version` table if it doesn't exist, then applies
    /// any migrations whose version is greater than the current schema
    /// version. All pending migrations run within a single transaction; if
    /// any migration fails, all changes are rolled back.
    pub fn run(conn: &Connection, migrations: &[Migration]) -> Result<(), StorageError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );",
        )?;

        let current_version = Self::current_version(conn)?;

        let pending: Vec<&Migration> = migrations
            .iter()
            .filter(|m| m.version > current_version)
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        for window in pending.windows(2) {
            if window[0].version >= window[1].version {
                return Err(StorageError::Migration(format!(
                    "Migrations are not in order: v{} before v{}",
                    window[0].version, window[1].version
                )));
            }
        }

        conn.execute_batch("BEGIN EXCLUSIVE TRANSACTION;")?;

        for migration in &pending {
            let applied = match &migration.action {
                MigrationAction::Sql(sql) => conn.execute_batch(sql).map_err(|e| {
                    StorageError::Migration(format!(
                        "Migration v{} '{}' failed: {}",
                        migration.version, migration.name, e
                    ))
                }),
                MigrationAction::Callback(cb) => cb(conn).map_err(|e| {
                    StorageError::Migration(format!(
                        "Migration v{} '{}' callback failed: {}",
                        migration.version, migration.name, e
                    ))
                }),
            };
            if let Err(e) = applied {
                conn.execute_batch("ROLLBACK;")?;
                return Err(e);
            }

            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);

            if let Err(e) = conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![migration.version, now as i64],
            ) {
                conn.execute_batch("ROLLBACK;")?;
                return Err(StorageError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e
                )));
            }
        }

        conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    /// Returns the current schema version, or 0 if no migrations have been
    /// applied.
    pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
        let table_exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        let version: Option<u32> = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .unwrap_or(None);

        Ok(version.unwrap_or(0))
    }
}
