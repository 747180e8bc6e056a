//! Local protection of a user's private key.
//!
//! At enrollment the private key is serialized with the token codec and
//! sealed in a passphrase envelope; that token is the only form in which the
//! key is kept. Each login reverses both steps.

use crate::config::EnvelopeConfig;
use crate::error::{CryptoError, CryptoResult};
use crate::passphrase;
use crate::random::SecureRandom;
use crate::token::PrivateKey;
use zeroize::Zeroizing;

/// Serializes and seals `key` under `passphrase`.
pub fn seal_private_key(
    key: &PrivateKey,
    passphrase: &str,
    rng: &SecureRandom,
    config: &EnvelopeConfig,
) -> CryptoResult<String> {
    let serialized = Zeroizing::new(key.to_token());
    passphrase::seal(serialized.as_bytes(), passphrase, rng, config)
}

/// Opens a token from [`seal_private_key`].
///
/// A legacy token opened with the wrong passphrase decrypts to garbage; that
/// garbage fails to parse and is reported as [`CryptoError::Decrypt`] like
/// every other failure.
pub fn open_private_key(token: &str, passphrase: &str) -> CryptoResult<PrivateKey> {
    let plaintext = passphrase::open(token, passphrase)?;
    let serialized = std::str::from_utf8(&plaintext).map_err(|_| CryptoError::Decrypt)?;
    PrivateKey::from_token(serialized).map_err(|_| CryptoError::Decrypt)
}

/// Re-seals a private key token under a new passphrase.
///
/// Verifies the token parses as a private key before re-sealing it.
pub fn change_passphrase(
    token: &str,
    old_passphrase: &str,
    new_passphrase: &str,
    rng: &SecureRandom,
    config: &EnvelopeConfig,
) -> CryptoResult<String> {
    let key = open_private_key(token, old_passphrase)?;
    seal_private_key(&key, new_passphrase, rng, config)
}
