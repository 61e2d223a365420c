// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Share Key Management
//!
//! Per-share symmetric key material with rotation history, plus the
//! asymmetric envelopes that deliver vault keys to a user's address key.

pub mod envelope;
pub mod share_key;
pub mod store;

pub use envelope::AddressKeyPair;
pub use share_key::{select_latest, EncryptedShareKey, KeyError, ShareKey};
pub use store::ShareKeyStore;
