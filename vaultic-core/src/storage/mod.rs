// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistent Storage Module
//!
//! The local encrypted cache: durable, queryable storage of shares, share
//! keys, items, and the access snapshot. Uses SQLite with application-level
//! encryption — every sensitive payload is sealed under the session master
//! key before it touches disk, and no plaintext is ever persisted.

mod access;
mod error;
mod items;
mod shares;

pub mod migration;
pub mod secure;

pub use error::StorageError;
pub use secure::{FileSecretStore, SecureStorage};

#[cfg(feature = "secure-storage")]
pub use secure::PlatformKeyring;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

use crate::crypto::{MasterKeyProvider, SymmetricKey};

/// SQLite-based cache implementation.
///
/// Holds the database connection and the session key handle. Every
/// operation that touches row payloads resolves the master key through the
/// provider, so a locked session fails fast instead of reading garbage.
pub struct Storage {
    conn: Connection,
    provider: Arc<MasterKeyProvider>,
}

impl Storage {
    /// Opens or creates a cache database at the given path.
    pub fn open<P: AsRef<Path>>(
        path: P,
        provider: Arc<MasterKeyProvider>,
    ) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Storage { conn, provider };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Creates an in-memory cache (for testing).
    pub fn in_memory(provider: Arc<MasterKeyProvider>) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Storage { conn, provider };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Runs all pending schema migrations.
    fn run_migrations(&self) -> Result<(), StorageError> {
        let migrations = migration::all_migrations();
        migration::MigrationRunner::run(&self.conn, &migrations)
    }

    /// Returns the current schema version.
    pub fn schema_version(&self) -> Result<u32, StorageError> {
        migration::MigrationRunner::current_version(&self.conn)
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Resolves the session master key, failing fast when locked.
    pub(crate) fn master_key(&self) -> Result<SymmetricKey, StorageError> {
        Ok(self.provider.get()?)
    }
}
