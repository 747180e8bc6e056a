//! Secret envelope.
//!
//! Every stored or rotated credential is encrypted under its own freshly
//! drawn 256-bit key. The key token is handed to the access-control layer,
//! which wraps the raw key for each authorized recipient before anything is
//! persisted; the unwrapped key token must never be stored.
//!
//! The key token is always `base64(32 key bytes)`. The ciphertext token is
//! either legacy `base64(AES-256-ECB(NUL-pad-16(secret)))` or
//! `v2:<nonce>:<ciphertext>` with ChaCha20-Poly1305 over the PKCS#7 padded
//! secret.

use crate::cipher::{self, EncryptedData, NONCE_SIZE};
use crate::config::EnvelopeConfig;
use crate::error::{CryptoError, CryptoResult};
use crate::key::KEY_SIZE;
use crate::legacy;
use crate::padding::{pad_pkcs7, unpad_pkcs7};
use crate::random::SecureRandom;
use crate::token::{
    SEPARATOR, TokenFormat, V2_TAG, b64_decode, b64_encode, decode_fields, join_fields,
};
use tracing::{debug, warn};
use zeroize::Zeroizing;

const AAD: &[u8] = b"credvault:secret:v2";
const PAD_BLOCK: usize = 16;

/// A freshly encrypted secret and the one-time key that opens it.
pub struct SecretEnvelope {
    key_token: Zeroizing<String>,
    ciphertext_token: String,
}

impl SecretEnvelope {
    /// Base64 of the one-time key. Must be wrapped per recipient, never stored as is.
    pub fn key_token(&self) -> &str {
        &self.key_token
    }

    pub fn ciphertext_token(&self) -> &str {
        &self.ciphertext_token
    }

    /// Raw one-time key, for the per-recipient wrapping step.
    pub fn key_bytes(&self) -> CryptoResult<Zeroizing<[u8; KEY_SIZE]>> {
        decode_key(&self.key_token)
    }

    pub fn into_tokens(self) -> (Zeroizing<String>, String) {
        (self.key_token, self.ciphertext_token)
    }
}

impl std::fmt::Debug for SecretEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretEnvelope")
            .field("key_token", &"[REDACTED]")
            .field("ciphertext_token", &self.ciphertext_token)
            .finish()
    }
}

/// Encrypts `secret` under a new one-time key in the configured format.
pub fn generate(
    secret: &[u8],
    rng: &SecureRandom,
    config: &EnvelopeConfig,
) -> CryptoResult<SecretEnvelope> {
    match config.format {
        TokenFormat::Legacy => {
            warn!("writing secret envelope in deprecated legacy format");
            generate_legacy(secret, rng)
        }
        TokenFormat::V2 => {
            let key = Zeroizing::new(rng.array::<KEY_SIZE>()?);
            let padded = pad_pkcs7(secret, PAD_BLOCK);
            let sealed = cipher::encrypt(&key, &padded, AAD, rng)?;
            Ok(SecretEnvelope {
                key_token: Zeroizing::new(b64_encode(&*key)),
                ciphertext_token: join_fields([
                    V2_TAG.to_string(),
                    b64_encode(&sealed.nonce),
                    b64_encode(&sealed.ciphertext),
                ]),
            })
        }
    }
}

/// Encrypts in the legacy format, byte-compatible with stored tokens.
pub fn generate_legacy(secret: &[u8], rng: &SecureRandom) -> CryptoResult<SecretEnvelope> {
    let key = Zeroizing::new(rng.array::<KEY_SIZE>()?);
    Ok(SecretEnvelope {
        key_token: Zeroizing::new(b64_encode(&*key)),
        ciphertext_token: legacy::encrypt_secret(&key, secret),
    })
}

/// Recovers the secret. Every failure is [`CryptoError::Decrypt`].
pub fn open(key_token: &str, ciphertext_token: &str) -> CryptoResult<Zeroizing<Vec<u8>>> {
    open_with_key(key_token, ciphertext_token).map_err(|_| {
        debug!("secret envelope open failed");
        CryptoError::Decrypt
    })
}

fn open_with_key(key_token: &str, ciphertext_token: &str) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let key = decode_key(key_token)?;
    match TokenFormat::detect(ciphertext_token)? {
        TokenFormat::Legacy => {
            debug!("opening legacy secret envelope");
            legacy::decrypt_secret(&key, ciphertext_token)
        }
        TokenFormat::V2 => open_v2(&key, ciphertext_token),
    }
}

fn open_v2(key: &[u8; KEY_SIZE], ciphertext_token: &str) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let body = ciphertext_token
        .strip_prefix(V2_TAG)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
        .ok_or(CryptoError::Decrypt)?;
    let mut fields = decode_fields(body, 2)?;
    let nonce: [u8; NONCE_SIZE] = fields[0]
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::Format("bad nonce length".into()))?;
    let sealed = EncryptedData {
        nonce,
        ciphertext: std::mem::take(&mut fields[1]),
    };

    let mut secret = cipher::decrypt(key, &sealed, AAD)?;
    unpad_pkcs7(&mut secret, PAD_BLOCK).ok_or(CryptoError::Decrypt)?;
    Ok(secret)
}

/// Re-encrypts an existing secret under a brand new one-time key.
///
/// The old key and its wrapped copies become useless once the caller
/// replaces them, which is how a secret is rotated after a revocation.
pub fn rotate(
    key_token: &str,
    ciphertext_token: &str,
    rng: &SecureRandom,
    config: &EnvelopeConfig,
) -> CryptoResult<SecretEnvelope> {
    let secret = open(key_token, ciphertext_token)?;
    generate(&secret, rng, config)
}

fn decode_key(key_token: &str) -> CryptoResult<Zeroizing<[u8; KEY_SIZE]>> {
    let raw = Zeroizing::new(b64_decode(key_token).map_err(|_| CryptoError::Decrypt)?);
    let key = <[u8; KEY_SIZE]>::try_from(raw.as_slice()).map_err(|_| CryptoError::Decrypt)?;
    Ok(Zeroizing::new(key))
}
