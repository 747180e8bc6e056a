//! Envelope configuration.

use crate::error::{CryptoError, CryptoResult};
use crate::key::KdfParams;
use crate::token::TokenFormat;
use serde::{Deserialize, Serialize};

/// Controls how new envelope tokens are written.
///
/// Reading is unaffected: every supported format is always accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Format for newly written tokens. Set to `legacy` only while older
    /// clients that cannot read `v2` are still deployed.
    pub format: TokenFormat,

    /// Argon2id cost for new passphrase envelopes.
    pub kdf: KdfParams,
}

impl EnvelopeConfig {
    /// Parses and validates a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> CryptoResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CryptoError::Config(format!("invalid JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CryptoResult<()> {
        self.kdf.validate()
    }

    /// Config that keeps writing legacy tokens.
    pub fn legacy() -> Self {
        Self {
            format: TokenFormat::Legacy,
            ..Self::default()
        }
    }
}
