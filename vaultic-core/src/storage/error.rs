//! Storage error types.

use thiserror::Error;

use crate::crypto::KeyUnavailable;

/// Storage error types.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error(transparent)]
    Key(#[from] KeyUnavailable),

    /// A cached row whose payload no longer decrypts. Detected corruption,
    /// never a silent null; the caller decides between skip-and-report and
    /// a targeted refetch.
    #[error("Corrupted record: share {share_id}, item {item_id:?}")]
    CorruptedRecord {
        share_id: String,
        item_id: Option<String>,
    },

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Key store error: {0}")]
    KeyStore(String),
}

impl StorageError {
    /// Whether this error is a detected-corruption condition.
    pub fn is_corrupted_record(&self) -> bool {
        matches!(self, StorageError::CorruptedRecord { .. })
    }
}
