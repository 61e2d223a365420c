// SPDX-FileCopyrightText: 2026 Vaultic Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Share Key Envelopes
//!
//! Asymmetric wrapping of vault keys to a user's address key, used when a
//! vault is created or ownership is transferred. An ephemeral X25519
//! exchange feeds HKDF-SHA256; the derived key seals the vault key with
//! the envelope AEAD domain.
//!
//! Envelope format: `ephemeral_public (32 bytes) || sealed key material`

use rand::rngs::OsRng;
use ring::hkdf;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::crypto::{decrypt, encrypt, EncryptionDomain, EncryptionError, SymmetricKey};

use super::share_key::KeyError;

/// HKDF info string binding derived keys to this envelope scheme.
const ENVELOPE_INFO: &[u8] = b"vaultic sharekey envelope v1";

/// Size of the ephemeral public key prefix.
const EPHEMERAL_PUBLIC_LEN: usize = 32;

/// A user's long-lived X25519 address key pair.
///
/// Established at account setup; the secret half never leaves the device.
pub struct AddressKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl AddressKeyPair {
    /// Generates a fresh address key pair.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        AddressKeyPair { secret, public }
    }

    /// Restores a key pair from stored secret bytes.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(bytes);
        let public = PublicKey::from(&secret);
        AddressKeyPair { secret, public }
    }

    /// The public half, as sent to the server at account setup.
    pub fn public_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }
}

impl std::fmt::Debug for AddressKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressKeyPair")
            .field("public", &hex::encode(self.public.as_bytes()))
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Seals key material to a recipient's address public key.
pub fn seal(recipient_public: &[u8; 32], key_material: &[u8]) -> Result<Vec<u8>, KeyError> {
    let recipient = PublicKey::from(*recipient_public);
    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = PublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(&recipient);

    let wrap_key = derive_wrap_key(
        shared.as_bytes(),
        ephemeral_public.as_bytes(),
        recipient_public,
    )
    .map_err(|_| KeyError::Crypto(EncryptionError::EncryptionFailed))?;

    let sealed = encrypt(&wrap_key, key_material, EncryptionDomain::ShareKeyEnvelope)?;

    let mut envelope = Vec::with_capacity(EPHEMERAL_PUBLIC_LEN + sealed.len());
    envelope.extend_from_slice(ephemeral_public.as_bytes());
    envelope.extend_from_slice(&sealed);
    Ok(envelope)
}

/// Opens an envelope sealed to this address key.
pub fn open(pair: &AddressKeyPair, envelope: &[u8]) -> Result<Vec<u8>, KeyError> {
    if envelope.len() <= EPHEMERAL_PUBLIC_LEN {
        return Err(KeyError::Malformed("envelope too short".into()));
    }

    let ephemeral_public: [u8; 32] = envelope[..EPHEMERAL_PUBLIC_LEN]
        .try_into()
        .map_err(|_| KeyError::Malformed("envelope ephemeral key".into()))?;
    let shared = pair
        .secret
        .diffie_hellman(&PublicKey::from(ephemeral_public));

    let wrap_key = derive_wrap_key(
        shared.as_bytes(),
        &ephemeral_public,
        pair.public.as_bytes(),
    )
    .map_err(|_| KeyError::Crypto(EncryptionError::DecryptionFailed))?;

    Ok(decrypt(
        &wrap_key,
        &envelope[EPHEMERAL_PUBLIC_LEN..],
        EncryptionDomain::ShareKeyEnvelope,
    )?)
}

/// HKDF-SHA256 over the shared secret, salted with both public keys.
fn derive_wrap_key(
    shared: &[u8; 32],
    ephemeral_public: &[u8; 32],
    recipient_public: &[u8; 32],
) -> Result<SymmetricKey, ring::error::Unspecified> {
    let mut salt_bytes = Vec::with_capacity(64);
    salt_bytes.extend_from_slice(ephemeral_public);
    salt_bytes.extend_from_slice(recipient_public);

    let salt = hkdf::Salt::new(hkdf::HKDF_SHA256, &salt_bytes);
    let prk = salt.extract(shared);
    let okm = prk.expand(&[ENVELOPE_INFO], hkdf::HKDF_SHA256)?;

    let mut key_bytes = [0u8; 32];
    okm.fill(&mut key_bytes)?;
    let key = SymmetricKey::from_bytes(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}
