//! Passphrase envelope.
//!
//! Protects a user's long-term private key material under a passphrase that
//! is never stored.
//!
//! # Formats
//!
//! - **legacy**: `base64(Blowfish-ECB(passphrase bytes, NUL-pad-8(plaintext)))`.
//!   No stretching, no integrity. Plaintexts ending in NUL bytes lose them.
//! - **v2**: `v2:<params>:<salt>:<nonce>:<ciphertext>`. The key is
//!   Argon2id(passphrase, salt, params); the plaintext is PKCS#7 padded and
//!   sealed with ChaCha20-Poly1305.
//!
//! [`open`] accepts both; [`seal`] writes the format named in the config.

use crate::cipher::{self, EncryptedData, NONCE_SIZE};
use crate::config::EnvelopeConfig;
use crate::error::{CryptoError, CryptoResult};
use crate::key::{KdfParams, SALT_SIZE, Salt, derive_key};
use crate::legacy;
use crate::padding::{pad_pkcs7, unpad_pkcs7};
use crate::random::SecureRandom;
use crate::token::{SEPARATOR, TokenFormat, V2_TAG, b64_encode, decode_fields, join_fields};
use tracing::{debug, warn};
use zeroize::Zeroizing;

const AAD: &[u8] = b"credvault:passphrase:v2";
const PAD_BLOCK: usize = 16;

/// Seals `plaintext` under `passphrase` in the configured format.
pub fn seal(
    plaintext: &[u8],
    passphrase: &str,
    rng: &SecureRandom,
    config: &EnvelopeConfig,
) -> CryptoResult<String> {
    match config.format {
        TokenFormat::Legacy => {
            warn!("writing passphrase envelope in deprecated legacy format");
            seal_legacy(plaintext, passphrase)
        }
        TokenFormat::V2 => seal_v2(plaintext, passphrase, rng, &config.kdf),
    }
}

/// Seals in the legacy format, byte-compatible with tokens already in storage.
pub fn seal_legacy(plaintext: &[u8], passphrase: &str) -> CryptoResult<String> {
    legacy::seal_with_passphrase(plaintext, passphrase)
}

fn seal_v2(
    plaintext: &[u8],
    passphrase: &str,
    rng: &SecureRandom,
    kdf: &KdfParams,
) -> CryptoResult<String> {
    if passphrase.is_empty() {
        return Err(CryptoError::KeyDerivation("passphrase is empty".into()));
    }
    let salt = Salt::random(rng)?;
    let key = derive_key(passphrase, &salt, kdf)?;
    let padded = pad_pkcs7(plaintext, PAD_BLOCK);
    let sealed = cipher::encrypt(key.as_bytes(), &padded, AAD, rng)?;

    Ok(join_fields([
        V2_TAG.to_string(),
        b64_encode(&kdf.to_bytes()),
        b64_encode(salt.as_bytes()),
        b64_encode(&sealed.nonce),
        b64_encode(&sealed.ciphertext),
    ]))
}

/// Opens a token produced by [`seal`] or [`seal_legacy`].
///
/// Every failure is reported as [`CryptoError::Decrypt`]. With a legacy token
/// a wrong passphrase may instead return garbage, never the original
/// plaintext.
pub fn open(token: &str, passphrase: &str) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let result = match TokenFormat::detect(token) {
        Ok(TokenFormat::Legacy) => {
            debug!("opening legacy passphrase envelope");
            legacy::open_with_passphrase(token, passphrase)
        }
        Ok(TokenFormat::V2) => open_v2(token, passphrase),
        Err(e) => Err(e),
    };
    result.map_err(|_| {
        debug!("passphrase envelope open failed");
        CryptoError::Decrypt
    })
}

fn v2_fields(token: &str) -> CryptoResult<Vec<Vec<u8>>> {
    let body = token
        .strip_prefix(V2_TAG)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))
        .ok_or(CryptoError::Decrypt)?;
    decode_fields(body, 4)
}

fn v2_params(token: &str) -> CryptoResult<KdfParams> {
    let fields = v2_fields(token)?;
    KdfParams::from_bytes(&fields[0])
}

fn open_v2(token: &str, passphrase: &str) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let mut fields = v2_fields(token)?;

    let params = KdfParams::from_bytes(&fields[0])?;
    let salt: [u8; SALT_SIZE] = fields[1]
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::Format("bad salt length".into()))?;
    let nonce: [u8; NONCE_SIZE] = fields[2]
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::Format("bad nonce length".into()))?;
    let sealed = EncryptedData {
        nonce,
        ciphertext: std::mem::take(&mut fields[3]),
    };

    let key = derive_key(passphrase, &Salt::from_bytes(salt), &params)?;
    let mut plaintext = cipher::decrypt(key.as_bytes(), &sealed, AAD)?;
    unpad_pkcs7(&mut plaintext, PAD_BLOCK).ok_or(CryptoError::Decrypt)?;
    Ok(plaintext)
}

/// Re-protects the contents of `token` under a new passphrase.
///
/// The result is written in the configured format, so this also upgrades
/// legacy tokens.
pub fn reseal(
    token: &str,
    old_passphrase: &str,
    new_passphrase: &str,
    rng: &SecureRandom,
    config: &EnvelopeConfig,
) -> CryptoResult<String> {
    let plaintext = open(token, old_passphrase)?;
    seal(&plaintext, new_passphrase, rng, config)
}

/// Whether `token` differs from what `config` would write: another format,
/// or v2 with other KDF parameters. Unreadable tokens always need resealing.
pub fn needs_reseal(token: &str, config: &EnvelopeConfig) -> bool {
    match TokenFormat::detect(token) {
        Ok(format) if format != config.format => true,
        Ok(TokenFormat::Legacy) => false,
        Ok(TokenFormat::V2) => !v2_params(token).is_ok_and(|params| params == config.kdf),
        Err(_) => true,
    }
}
