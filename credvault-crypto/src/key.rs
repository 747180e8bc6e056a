//! Passphrase key derivation.
//!
//! Current-format passphrase envelopes stretch the passphrase with Argon2id
//! before use. The parameters travel inside the token so they can be raised
//! later without breaking existing tokens.

use argon2::{Algorithm, Argon2, Params, Version};
use crate::error::{CryptoError, CryptoResult};
use crate::random::SecureRandom;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a derived or one-time symmetric key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of an Argon2id salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Size of [`KdfParams`] once packed into a token field.
pub const PACKED_PARAMS_SIZE: usize = 12;

/// Largest accepted memory cost (256 MiB). Token parameters are used before
/// the token is authenticated, so the caps bound what a crafted token costs.
pub const MAX_MEMORY_KIB: u32 = 256 * 1024;
/// Largest accepted number of passes.
pub const MAX_ITERATIONS: u32 = 8;
/// Largest accepted degree of parallelism.
pub const MAX_PARALLELISM: u32 = 8;

/// Argon2id cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    /// Checks the parameters are usable by Argon2id and within the
    /// accepted maximums.
    pub fn validate(&self) -> CryptoResult<()> {
        if self.iterations == 0 {
            return Err(CryptoError::Config("iterations must be at least 1".into()));
        }
        if self.parallelism == 0 {
            return Err(CryptoError::Config("parallelism must be at least 1".into()));
        }
        if self.memory_kib < 8 * self.parallelism {
            return Err(CryptoError::Config(format!(
                "memory_kib must be at least {} for parallelism {}",
                8 * self.parallelism,
                self.parallelism
            )));
        }
        if self.memory_kib > MAX_MEMORY_KIB
            || self.iterations > MAX_ITERATIONS
            || self.parallelism > MAX_PARALLELISM
        {
            return Err(CryptoError::Config(format!(
                "KDF parameters exceed the maximum of {MAX_MEMORY_KIB} KiB, \
                 {MAX_ITERATIONS} iterations, {MAX_PARALLELISM} lanes"
            )));
        }
        Ok(())
    }

    /// Packs the parameters as three big-endian u32 values.
    pub fn to_bytes(&self) -> [u8; PACKED_PARAMS_SIZE] {
        let mut out = [0u8; PACKED_PARAMS_SIZE];
        out[0..4].copy_from_slice(&self.memory_kib.to_be_bytes());
        out[4..8].copy_from_slice(&self.iterations.to_be_bytes());
        out[8..12].copy_from_slice(&self.parallelism.to_be_bytes());
        out
    }

    /// Unpacks parameters read from a token, rejecting values that fail
    /// [`KdfParams::validate`].
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let packed: [u8; PACKED_PARAMS_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::Format(format!(
                "KDF parameters must be {PACKED_PARAMS_SIZE} bytes, found {}",
                bytes.len()
            ))
        })?;
        let [m0, m1, m2, m3, i0, i1, i2, i3, p0, p1, p2, p3] = packed;
        let params = Self {
            memory_kib: u32::from_be_bytes([m0, m1, m2, m3]),
            iterations: u32::from_be_bytes([i0, i1, i2, i3]),
            parallelism: u32::from_be_bytes([p0, p1, p2, p3]),
        };
        params.validate()?;
        Ok(params)
    }
}

/// Argon2id salt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Salt {
    /// Draws a fresh salt.
    pub fn random(rng: &SecureRandom) -> CryptoResult<Self> {
        Ok(Self(rng.array()?))
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.0
    }
}

/// A 256-bit symmetric key, wiped from memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_SIZE]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derives a 256-bit key from a passphrase with Argon2id v1.3.
pub fn derive_key(passphrase: &str, salt: &Salt, params: &KdfParams) -> CryptoResult<DerivedKey> {
    params.validate()?;
    let argon_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(KEY_SIZE),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);
    let mut key = DerivedKey([0u8; KEY_SIZE]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt.as_bytes(), &mut key.0)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn derivation_is_deterministic() {
        let salt = Salt::from_bytes([1; SALT_SIZE]);
        let a = derive_key("passphrase", &salt, &fast()).unwrap();
        let b = derive_key("passphrase", &salt, &fast()).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn salt_and_passphrase_both_matter() {
        let salt_a = Salt::from_bytes([1; SALT_SIZE]);
        let salt_b = Salt::from_bytes([2; SALT_SIZE]);
        let base = derive_key("one", &salt_a, &fast()).unwrap();
        let other_passphrase = derive_key("two", &salt_a, &fast()).unwrap();
        let other_salt = derive_key("one", &salt_b, &fast()).unwrap();
        assert_ne!(base.as_bytes(), other_passphrase.as_bytes());
        assert_ne!(base.as_bytes(), other_salt.as_bytes());
    }

    #[test]
    fn params_pack_round_trip() {
        let params = KdfParams::default();
        assert_eq!(KdfParams::from_bytes(&params.to_bytes()).unwrap(), params);
    }

    #[test]
    fn oversized_params_rejected() {
        let params = KdfParams {
            memory_kib: u32::MAX,
            iterations: 1,
            parallelism: 1,
        };
        assert!(KdfParams::from_bytes(&params.to_bytes()).is_err());
    }

    #[test]
    fn memory_cap_is_inclusive() {
        let at_cap = KdfParams {
            memory_kib: MAX_MEMORY_KIB,
            iterations: 1,
            parallelism: 1,
        };
        assert_eq!(KdfParams::from_bytes(&at_cap.to_bytes()).unwrap(), at_cap);

        let over = KdfParams {
            memory_kib: MAX_MEMORY_KIB + 1,
            ..at_cap
        };
        assert!(matches!(
            KdfParams::from_bytes(&over.to_bytes()),
            Err(CryptoError::Config(_))
        ));
    }

    #[test]
    fn excess_passes_and_lanes_rejected() {
        let many_passes = KdfParams {
            iterations: 16,
            ..fast()
        };
        assert!(many_passes.validate().is_err());

        let many_lanes = KdfParams {
            memory_kib: 8 * 16,
            iterations: 1,
            parallelism: 16,
        };
        assert!(many_lanes.validate().is_err());
    }

    #[test]
    fn default_params_within_caps() {
        assert!(KdfParams::default().validate().is_ok());
    }

    #[test]
    fn packed_params_wrong_length_is_format_error() {
        let err = KdfParams::from_bytes(&[0u8; 8]).unwrap_err();
        assert!(matches!(err, CryptoError::Format(_)));
    }

    #[test]
    fn zero_iterations_invalid() {
        let params = KdfParams {
            iterations: 0,
            ..KdfParams::default()
        };
        assert!(matches!(params.validate(), Err(CryptoError::Config(_))));
    }

    #[test]
    fn memory_below_parallelism_floor_invalid() {
        let params = KdfParams {
            memory_kib: 8,
            iterations: 1,
            parallelism: 4,
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let key = DerivedKey::from_bytes([0xAB; KEY_SIZE]);
        assert_eq!(format!("{key:?}"), "DerivedKey([REDACTED])");
    }
}
