//! Legacy block-cipher tokens.
//!
//! Tokens written before the `v2` format are a single base64 field holding
//! raw ECB output: Blowfish keyed directly with the passphrase bytes for
//! passphrase envelopes, AES-256 under the one-time key for secret
//! envelopes. Both NUL-pad the plaintext and strip trailing NULs on the way
//! back. These routines must stay byte-compatible with stored data.

use aes::Aes256;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use blowfish::Blowfish;
use crate::error::{CryptoError, CryptoResult};
use crate::key::KEY_SIZE;
use crate::padding::{pad_nul, strip_nul};
use crate::token::{b64_decode, b64_encode};
use zeroize::Zeroizing;

/// Blowfish block size.
pub const PASSPHRASE_BLOCK: usize = 8;

/// AES block size.
pub const SECRET_BLOCK: usize = 16;

const BLOWFISH_MIN_KEY: usize = 4;
const BLOWFISH_MAX_KEY: usize = 56;

fn ecb_encrypt<C: BlockEncrypt>(cipher: &C, buf: &mut [u8]) {
    for block in buf.chunks_exact_mut(C::block_size()) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
}

fn ecb_decrypt<C: BlockDecrypt>(cipher: &C, buf: &mut [u8]) {
    for block in buf.chunks_exact_mut(C::block_size()) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }
}

/// Builds the Blowfish key from the raw passphrase bytes.
///
/// The Blowfish key schedule consumes key bytes cyclically, so repeating a
/// short passphrase whole until it reaches the 4-byte minimum yields the
/// same schedule as the passphrase itself.
fn blowfish_cipher(passphrase: &str) -> CryptoResult<Blowfish> {
    let raw = passphrase.as_bytes();
    if raw.is_empty() {
        return Err(CryptoError::KeyDerivation("passphrase is empty".into()));
    }
    if raw.len() > BLOWFISH_MAX_KEY {
        return Err(CryptoError::KeyDerivation(format!(
            "legacy passphrase longer than {BLOWFISH_MAX_KEY} bytes"
        )));
    }

    let mut key = Zeroizing::new(raw.to_vec());
    while key.len() < BLOWFISH_MIN_KEY {
        key.extend_from_slice(raw);
    }
    let cipher: Blowfish = Blowfish::new_from_slice(&key)
        .map_err(|_| CryptoError::KeyDerivation("bad key length".into()))?;
    Ok(cipher)
}

/// Blowfish-ECB over the NUL-padded plaintext, base64 encoded.
pub(crate) fn seal_with_passphrase(plaintext: &[u8], passphrase: &str) -> CryptoResult<String> {
    let cipher = blowfish_cipher(passphrase)?;
    let mut buf = pad_nul(plaintext, PASSPHRASE_BLOCK);
    ecb_encrypt(&cipher, &mut buf);
    Ok(b64_encode(&buf))
}

/// Reverses [`seal_with_passphrase`]. A wrong passphrase usually yields
/// garbage rather than an error; the format has no integrity check.
pub(crate) fn open_with_passphrase(
    token: &str,
    passphrase: &str,
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let mut buf = Zeroizing::new(b64_decode(token).map_err(|_| CryptoError::Decrypt)?);
    if buf.len() % PASSPHRASE_BLOCK != 0 {
        return Err(CryptoError::Decrypt);
    }
    let cipher = blowfish_cipher(passphrase).map_err(|_| CryptoError::Decrypt)?;
    ecb_decrypt(&cipher, &mut buf);
    strip_nul(&mut buf);
    Ok(buf)
}

/// AES-256-ECB over the NUL-padded secret; returns the ciphertext token.
pub(crate) fn encrypt_secret(key: &[u8; KEY_SIZE], secret: &[u8]) -> String {
    let cipher = Aes256::new(GenericArray::from_slice(key));
    let mut buf = pad_nul(secret, SECRET_BLOCK);
    ecb_encrypt(&cipher, &mut buf);
    b64_encode(&buf)
}

/// Reverses [`encrypt_secret`].
pub(crate) fn decrypt_secret(
    key: &[u8; KEY_SIZE],
    ciphertext_token: &str,
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let decoded = b64_decode(ciphertext_token).map_err(|_| CryptoError::Decrypt)?;
    let mut buf = Zeroizing::new(decoded);
    if buf.len() % SECRET_BLOCK != 0 {
        return Err(CryptoError::Decrypt);
    }
    let cipher = Aes256::new(GenericArray::from_slice(key));
    ecb_decrypt(&cipher, &mut buf);
    strip_nul(&mut buf);
    Ok(buf)
}
