//! Encryption layer for credvault.
//!
//! Protects short secrets so the storage and transport tiers never see them
//! in the clear, while letting many authorized users recover them.
//!
//! # Architecture
//!
//! 1. **Secret envelope**: each credential is encrypted under a fresh
//!    one-time key. The key token goes to the access-control layer, which
//!    wraps it for every authorized recipient's public key.
//!
//! 2. **Passphrase envelope**: a user's long-term private key is kept only
//!    as a passphrase-sealed token and opened on each login.
//!
//! 3. **Token codec**: keys and asymmetric message pairs travel as
//!    colon-separated base64 fields.
//!
//! Randomness always comes from an explicitly passed [`SecureRandom`].
//!
//! Envelope tokens come in two formats. Legacy tokens (untagged ECB with NUL
//! padding, unstretched passphrase) are still read and can be written for
//! old clients; new tokens default to the `v2` format (Argon2id,
//! ChaCha20-Poly1305, PKCS#7 padding).

pub mod cipher;
pub mod config;
mod error;
pub mod key;
pub mod keyring;
mod legacy;
mod padding;
pub mod passphrase;
pub mod random;
pub mod secret;
pub mod token;

pub use config::EnvelopeConfig;
pub use error::{CryptoError, CryptoResult, GENERIC_FAILURE};
pub use key::{DerivedKey, KEY_SIZE, KdfParams, SALT_SIZE, Salt, derive_key};
pub use keyring::{change_passphrase, open_private_key, seal_private_key};
pub use random::SecureRandom;
pub use secret::SecretEnvelope;
pub use token::{
    MessagePair, PrivateKey, PublicKey, TokenFormat, decode_message_pair, decode_private_key,
    decode_public_key, encode_message_pair, encode_private_key, encode_public_key,
};
