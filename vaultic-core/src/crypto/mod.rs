// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod encryption;
pub mod password_kdf;
pub mod provider;

pub use encryption::{
    decrypt, encrypt, EncryptionDomain, EncryptionError, SymmetricKey, MIN_SEALED_LEN,
};
pub use password_kdf::{derive_key_argon2id, PasswordKdfError};
pub use provider::{KeyUnavailable, MasterKeyProvider};
