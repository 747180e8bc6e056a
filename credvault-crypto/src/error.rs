//! Error types for the credvault crypto layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Message shown to end users for any failure to recover protected material.
pub const GENERIC_FAILURE: &str = "cannot decrypt";

/// Errors that can occur in crypto operations.
///
/// None of these are retriable: a malformed token or a wrong passphrase
/// fails the same way every time.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Malformed token: wrong field count, invalid base64 or unknown version tag.
    #[error("malformed token: {0}")]
    Format(String),

    /// Ciphertext could not be recovered with the given key or passphrase.
    ///
    /// Deliberately carries no detail about which check failed.
    #[error("cannot decrypt")]
    Decrypt,

    /// Negative integer where a non-negative one is required.
    #[error("value out of range: {0}")]
    Range(String),

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("entropy source failure: {0}")]
    Entropy(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CryptoError {
    /// The text to surface to an end user.
    ///
    /// Every failure that can come out of decoding or opening a token maps to
    /// the same string so the caller cannot be used as a decryption oracle.
    /// Opening never surfaces `KeyDerivation`; it is only seen when sealing.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Format(_) | Self::Decrypt | Self::Range(_) => GENERIC_FAILURE,
            Self::KeyDerivation(_) => "passphrase not usable",
            Self::Encryption(_) => "cannot encrypt",
            Self::Entropy(_) => "random source unavailable",
            Self::Config(_) => "invalid configuration",
        }
    }

    /// Whether this error came from a failed attempt to recover protected data.
    pub fn is_decrypt_failure(&self) -> bool {
        self.user_message() == GENERIC_FAILURE
    }
}
