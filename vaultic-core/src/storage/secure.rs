// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Secure Secret Storage
//!
//! Persists the device-protected master secret between sessions. Uses OS
//! keychains (macOS Keychain, Linux Secret Service, Windows Credential
//! Manager) when available, with a fallback to file storage wrapped under
//! a device-local key. The engine treats both as an opaque key-store
//! capability.

use std::path::PathBuf;

use crate::crypto::{self, EncryptionDomain, SymmetricKey};
use crate::storage::StorageError;

/// Trait for secure storage of the master secret and other small secrets.
pub trait SecureStorage: Send + Sync {
    /// Saves a secret under a name.
    fn store_secret(&self, name: &str, secret: &[u8]) -> Result<(), StorageError>;

    /// Loads a secret by name. Returns `None` if it doesn't exist.
    fn load_secret(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Deletes a secret by name. Deleting a missing secret is not an error.
    fn delete_secret(&self, name: &str) -> Result<(), StorageError>;

    /// Checks whether a secret exists.
    fn has_secret(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.load_secret(name)?.is_some())
    }
}

/// Platform keyring implementation using the `keyring` crate.
/// Available when the `secure-storage` feature is enabled.
#[cfg(feature = "secure-storage")]
pub struct PlatformKeyring {
    service: String,
}

#[cfg(feature = "secure-storage")]
impl PlatformKeyring {
    /// Creates a new platform keyring accessor.
    ///
    /// # Arguments
    /// * `service` - The service name for keychain entries (e.g., "vaultic")
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

#[cfg(feature = "secure-storage")]
impl SecureStorage for PlatformKeyring {
    fn store_secret(&self, name: &str, secret: &[u8]) -> Result<(), StorageError> {
        let entry = keyring::Entry::new(&self.service, name)
            .map_err(|e| StorageError::KeyStore(format!("Keyring error: {}", e)))?;

        entry
            .set_secret(secret)
            .map_err(|e| StorageError::KeyStore(format!("Failed to save to keychain: {}", e)))
    }

    fn load_secret(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let entry = keyring::Entry::new(&self.service, name)
            .map_err(|e| StorageError::KeyStore(format!("Keyring error: {}", e)))?;

        match entry.get_secret() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StorageError::KeyStore(format!(
                "Failed to load from keychain: {}",
                e
            ))),
        }
    }

    fn delete_secret(&self, name: &str) -> Result<(), StorageError> {
        let entry = keyring::Entry::new(&self.service, name)
            .map_err(|e| StorageError::KeyStore(format!("Keyring error: {}", e)))?;

        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()), // Already deleted
            Err(e) => Err(StorageError::KeyStore(format!(
                "Failed to delete from keychain: {}",
                e
            ))),
        }
    }
}

/// File-based secret storage (fallback when no keyring is available).
/// Secrets are wrapped under a device-local key before hitting disk.
pub struct FileSecretStore {
    path: PathBuf,
    wrapping_key: SymmetricKey,
}

impl FileSecretStore {
    /// Creates a new file-based secret store.
    ///
    /// # Arguments
    /// * `path` - Directory where wrapped secrets are written
    /// * `wrapping_key` - Device-local key used to wrap stored secrets
    pub fn new(path: PathBuf, wrapping_key: SymmetricKey) -> Self {
        Self { path, wrapping_key }
    }

    fn secret_file_path(&self, name: &str) -> PathBuf {
        // Sanitize the name to prevent path traversal
        let safe_name = name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
            .collect::<String>();
        self.path.join(format!("{}.secret", safe_name))
    }
}

impl SecureStorage for FileSecretStore {
    fn store_secret(&self, name: &str, secret: &[u8]) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.path)
            .map_err(|e| StorageError::KeyStore(format!("Failed to create directory: {}", e)))?;

        let wrapped = crypto::encrypt(&self.wrapping_key, secret, EncryptionDomain::ShareKeyWrap)
            .map_err(|e| StorageError::KeyStore(format!("Wrap failed: {}", e)))?;

        let file_path = self.secret_file_path(name);
        std::fs::write(&file_path, &wrapped)
            .map_err(|e| StorageError::KeyStore(format!("Failed to write secret file: {}", e)))
    }

    fn load_secret(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let file_path = self.secret_file_path(name);

        if !file_path.exists() {
            return Ok(None);
        }

        let wrapped = std::fs::read(&file_path)
            .map_err(|e| StorageError::KeyStore(format!("Failed to read secret file: {}", e)))?;

        let secret = crypto::decrypt(&self.wrapping_key, &wrapped, EncryptionDomain::ShareKeyWrap)
            .map_err(|e| StorageError::KeyStore(format!("Unwrap failed: {}", e)))?;

        Ok(Some(secret))
    }

    fn delete_secret(&self, name: &str) -> Result<(), StorageError> {
        let file_path = self.secret_file_path(name);

        if file_path.exists() {
            std::fs::remove_file(&file_path).map_err(|e| {
                StorageError::KeyStore(format!("Failed to delete secret file: {}", e))
            })?;
        }

        Ok(())
    }
}
