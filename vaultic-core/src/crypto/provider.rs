// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Master Key Provider
//!
//! Owns the single session-wide symmetric key that wraps everything
//! persisted locally. The provider is an explicit handle threaded through
//! every constructor that needs the key; there is no process-global state.
//!
//! Lifecycle: the key is installed (or derived from the account password)
//! on unlock and dropped-and-zeroized on lock or logout. After [`remove`],
//! every [`get`] fails with [`KeyUnavailable`] until the next unlock.
//!
//! [`remove`]: MasterKeyProvider::remove
//! [`get`]: MasterKeyProvider::get

use std::sync::Mutex;

use super::password_kdf::{derive_key_argon2id, PasswordKdfError};
use super::SymmetricKey;

/// No session key has been established.
///
/// Fatal to the current operation; callers must not retry, the user has to
/// re-authenticate first.
#[derive(Debug, thiserror::Error)]
#[error("no session key has been established")]
pub struct KeyUnavailable;

/// Holds the session master key for one unlocked session.
#[derive(Default)]
pub struct MasterKeyProvider {
    key: Mutex<Option<SymmetricKey>>,
}

impl MasterKeyProvider {
    /// Creates a locked provider with no session key.
    pub fn new() -> Self {
        MasterKeyProvider {
            key: Mutex::new(None),
        }
    }

    /// Creates a provider already holding a session key (for tests and
    /// device-key unlock paths where derivation happened elsewhere).
    pub fn unlocked(key: SymmetricKey) -> Self {
        MasterKeyProvider {
            key: Mutex::new(Some(key)),
        }
    }

    /// Installs a session key, replacing any previous one.
    ///
    /// The previous key, if any, is zeroized on drop.
    pub fn install(&self, key: SymmetricKey) {
        let mut guard = self.key.lock().expect("master key lock poisoned");
        *guard = Some(key);
    }

    /// Derives the session key from the account password and installs it.
    pub fn unlock_with_password(
        &self,
        password: &[u8],
        salt: &[u8],
    ) -> Result<(), PasswordKdfError> {
        let key = derive_key_argon2id(password, salt)?;
        self.install(key);
        Ok(())
    }

    /// Returns a clone of the session key.
    ///
    /// Clones are cheap and zeroized on drop; the provider remains the only
    /// writer of the key slot.
    pub fn get(&self) -> Result<SymmetricKey, KeyUnavailable> {
        let guard = self.key.lock().expect("master key lock poisoned");
        guard.clone().ok_or(KeyUnavailable)
    }

    /// Whether a session key is currently installed.
    pub fn is_unlocked(&self) -> bool {
        self.key
            .lock()
            .expect("master key lock poisoned")
            .is_some()
    }

    /// Drops the session key.
    ///
    /// The key is zeroized on drop; subsequent [`MasterKeyProvider::get`]
    /// calls fail with [`KeyUnavailable`].
    pub fn remove(&self) {
        let mut guard = self.key.lock().expect("master key lock poisoned");
        *guard = None;
    }
}

impl std::fmt::Debug for MasterKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKeyProvider")
            .field("unlocked", &self.is_unlocked())
            .finish()
    }
}
