//! Secure random source.
//!
//! A [`SecureRandom`] wraps a ChaCha-based CSPRNG behind a mutex. Instances
//! are created explicitly and passed to every operation that needs fresh key
//! material, salts or nonces; there is no process-wide singleton.
//!
//! Production code builds one with [`SecureRandom::from_os_entropy`], which
//! seeds from the operating system and stirs in a second OS draw before the
//! first byte is handed out. Tests build one with [`SecureRandom::from_seed`]
//! so output is reproducible while still coming from a cryptographic
//! generator.

use crate::error::{CryptoError, CryptoResult};
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng, TryRngCore};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use zeroize::Zeroizing;

/// Size of the generator seed in bytes.
pub const SEED_SIZE: usize = 32;

/// Cryptographically secure byte generator, safe to share between threads.
pub struct SecureRandom {
    inner: Mutex<StdRng>,
}

impl SecureRandom {
    /// Seeds a generator from OS entropy and stirs it once before use.
    pub fn from_os_entropy() -> CryptoResult<Self> {
        let seed = os_seed()?;
        let rng = Self {
            inner: Mutex::new(StdRng::from_seed(*seed)),
        };
        rng.stir()?;
        debug!("secure random source seeded from OS entropy");
        Ok(rng)
    }

    /// Creates a deterministic generator from a fixed seed.
    ///
    /// The generator is still a CSPRNG; only its seed is predictable. Meant for
    /// tests and known-answer vectors.
    pub fn from_seed(seed: [u8; SEED_SIZE]) -> Self {
        Self {
            inner: Mutex::new(StdRng::from_seed(seed)),
        }
    }

    /// Re-seeds from OS entropy mixed with the current generator state.
    pub fn stir(&self) -> CryptoResult<()> {
        let fresh = os_seed()?;
        let mut guard = self.lock()?;

        let mut mixed = Zeroizing::new([0u8; SEED_SIZE]);
        guard.fill_bytes(mixed.as_mut());
        for (m, f) in mixed.iter_mut().zip(fresh.iter()) {
            *m ^= f;
        }
        *guard = StdRng::from_seed(*mixed);
        debug!("secure random source stirred");
        Ok(())
    }

    /// Fills `buf` with unpredictable bytes.
    pub fn fill_bytes(&self, buf: &mut [u8]) -> CryptoResult<()> {
        self.lock()?.fill_bytes(buf);
        Ok(())
    }

    /// Returns `n` unpredictable bytes.
    pub fn get_bytes(&self, n: usize) -> CryptoResult<Vec<u8>> {
        let mut out = vec![0u8; n];
        self.fill_bytes(&mut out)?;
        Ok(out)
    }

    /// Returns a fixed-size array of unpredictable bytes.
    pub fn array<const N: usize>(&self) -> CryptoResult<[u8; N]> {
        let mut out = [0u8; N];
        self.fill_bytes(&mut out)?;
        Ok(out)
    }

    fn lock(&self) -> CryptoResult<MutexGuard<'_, StdRng>> {
        self.inner
            .lock()
            .map_err(|_| CryptoError::Entropy("lock poisoned".to_string()))
    }
}

impl std::fmt::Debug for SecureRandom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureRandom").finish_non_exhaustive()
    }
}

fn os_seed() -> CryptoResult<Zeroizing<[u8; SEED_SIZE]>> {
    let mut seed = Zeroizing::new([0u8; SEED_SIZE]);
    OsRng
        .try_fill_bytes(seed.as_mut())
        .map_err(|e| CryptoError::Entropy(format!("OS read failed: {e}")))?;
    Ok(seed)
}
