//! Canonical token codec.
//!
//! A token is an ASCII string of colon-separated fields, each field
//! independently base64 encoded with the standard alphabet and padding.
//! Base64 never emits `:`, so splitting on the separator is unambiguous.
//!
//! Integers are written as their minimal big-endian byte string (zero is a
//! single `0x00` byte). The shapes here are persisted by the storage tier and
//! must not change.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use crate::error::{CryptoError, CryptoResult};
use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};

/// Field separator.
pub const SEPARATOR: char = ':';

/// Leading field of every current-format envelope token.
pub const V2_TAG: &str = "v2";

pub(crate) fn b64_encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn b64_decode(field: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(field)
}

/// Joins already-encoded fields.
pub(crate) fn join_fields<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(field.as_ref());
    }
    out
}

/// Splits `token` into exactly `expected` base64 fields and decodes each.
pub(crate) fn decode_fields(token: &str, expected: usize) -> CryptoResult<Vec<Vec<u8>>> {
    let fields: Vec<&str> = token.split(SEPARATOR).collect();
    if fields.len() != expected {
        return Err(CryptoError::Format(format!(
            "expected {expected} fields, found {}",
            fields.len()
        )));
    }
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            b64_decode(field).map_err(|e| CryptoError::Format(format!("field {i}: {e}")))
        })
        .collect()
}

fn encode_integers(values: &[&BigUint]) -> String {
    join_fields(values.iter().map(|v| b64_encode(&v.to_bytes_be())))
}

fn decode_integers<const N: usize>(token: &str) -> CryptoResult<[BigUint; N]> {
    let fields = decode_fields(token, N)?;
    Ok(std::array::from_fn(|i| BigUint::from_bytes_be(&fields[i])))
}

fn non_negative(value: BigInt, name: &str) -> CryptoResult<BigUint> {
    match value.to_biguint() {
        Some(v) => Ok(v),
        None => Err(CryptoError::Range(format!("{name} is negative"))),
    }
}

/// `base64(c1) ":" base64(c2)`.
pub fn encode_message_pair(c1: &[u8], c2: &[u8]) -> String {
    join_fields([b64_encode(c1), b64_encode(c2)])
}

/// Inverse of [`encode_message_pair`].
pub fn decode_message_pair(token: &str) -> CryptoResult<(Vec<u8>, Vec<u8>)> {
    let mut fields = decode_fields(token, 2)?.into_iter();
    match (fields.next(), fields.next()) {
        (Some(c1), Some(c2)) => Ok((c1, c2)),
        _ => Err(CryptoError::Format("expected 2 fields".into())),
    }
}

/// Serializes public parameters `(p, g, y)`.
pub fn encode_public_key(p: &BigUint, g: &BigUint, y: &BigUint) -> String {
    encode_integers(&[p, g, y])
}

/// Inverse of [`encode_public_key`].
pub fn decode_public_key(token: &str) -> CryptoResult<(BigUint, BigUint, BigUint)> {
    let [p, g, y] = decode_integers::<3>(token)?;
    Ok((p, g, y))
}

/// Serializes private key material `(p, g, y, x)`.
pub fn encode_private_key(p: &BigUint, g: &BigUint, y: &BigUint, x: &BigUint) -> String {
    encode_integers(&[p, g, y, x])
}

/// Inverse of [`encode_private_key`].
pub fn decode_private_key(token: &str) -> CryptoResult<(BigUint, BigUint, BigUint, BigUint)> {
    let [p, g, y, x] = decode_integers::<4>(token)?;
    Ok((p, g, y, x))
}

/// Output of an asymmetric encryption against a [`PublicKey`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessagePair {
    pub c1: Vec<u8>,
    pub c2: Vec<u8>,
}

impl MessagePair {
    pub fn to_token(&self) -> String {
        encode_message_pair(&self.c1, &self.c2)
    }

    pub fn from_token(token: &str) -> CryptoResult<Self> {
        let (c1, c2) = decode_message_pair(token)?;
        Ok(Self { c1, c2 })
    }
}

/// A recipient's public encryption parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    pub p: BigUint,
    pub g: BigUint,
    pub y: BigUint,
}

impl PublicKey {
    /// Builds a key from signed integers, rejecting negative components.
    pub fn from_signed(p: BigInt, g: BigInt, y: BigInt) -> CryptoResult<Self> {
        Ok(Self {
            p: non_negative(p, "p")?,
            g: non_negative(g, "g")?,
            y: non_negative(y, "y")?,
        })
    }

    pub fn to_token(&self) -> String {
        encode_public_key(&self.p, &self.g, &self.y)
    }

    pub fn from_token(token: &str) -> CryptoResult<Self> {
        let (p, g, y) = decode_public_key(token)?;
        Ok(Self { p, g, y })
    }
}

/// A user's private key; embeds the public parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    pub p: BigUint,
    pub g: BigUint,
    pub y: BigUint,
    pub x: BigUint,
}

impl PrivateKey {
    /// Builds a key from signed integers, rejecting negative components.
    pub fn from_signed(p: BigInt, g: BigInt, y: BigInt, x: BigInt) -> CryptoResult<Self> {
        Ok(Self {
            p: non_negative(p, "p")?,
            g: non_negative(g, "g")?,
            y: non_negative(y, "y")?,
            x: non_negative(x, "x")?,
        })
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            p: self.p.clone(),
            g: self.g.clone(),
            y: self.y.clone(),
        }
    }

    pub fn to_token(&self) -> String {
        encode_private_key(&self.p, &self.g, &self.y, &self.x)
    }

    pub fn from_token(token: &str) -> CryptoResult<Self> {
        let (p, g, y, x) = decode_private_key(token)?;
        Ok(Self { p, g, y, x })
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("p", &self.p)
            .field("g", &self.g)
            .field("y", &self.y)
            .field("x", &"[REDACTED]")
            .finish()
    }
}

/// Envelope token formats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenFormat {
    /// Untagged single base64 field, ECB with NUL padding.
    Legacy,
    /// `v2:`-tagged, Argon2id and ChaCha20-Poly1305 with PKCS#7 padding.
    #[default]
    V2,
}

impl TokenFormat {
    /// Detects the format of an envelope token.
    ///
    /// Legacy tokens are one base64 field and never contain the separator.
    pub fn detect(token: &str) -> CryptoResult<Self> {
        match token.split_once(SEPARATOR) {
            None => Ok(Self::Legacy),
            Some((V2_TAG, _)) => Ok(Self::V2),
            Some((tag, _)) => Err(CryptoError::Format(format!("unknown version `{tag}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn big(v: u64) -> BigUint {
        BigUint::from(v)
    }

    #[test]
    fn private_key_scenario() {
        let token = encode_private_key(&big(7), &big(3), &big(5), &big(2));
        assert_eq!(token, "Bw==:Aw==:BQ==:Ag==");
        assert_eq!(token.split(SEPARATOR).count(), 4);
        assert_eq!(
            decode_private_key(&token).unwrap(),
            (big(7), big(3), big(5), big(2))
        );
    }

    #[test]
    fn integers_use_minimal_big_endian() {
        assert_eq!(
            encode_public_key(&big(65537), &big(256), &big(0)),
            "AQAB:AQA=:AA=="
        );
    }

    #[test]
    fn empty_field_decodes_to_zero() {
        let (p, g, y) = decode_public_key("::").unwrap();
        assert_eq!((p, g, y), (big(0), big(0), big(0)));
    }

    #[test]
    fn two_fields_for_public_key_is_format_error() {
        let err = decode_public_key("YQ==:Yg==").unwrap_err();
        assert!(matches!(err, CryptoError::Format(_)), "got {err:?}");
    }

    #[test]
    fn too_many_fields_is_format_error() {
        assert!(matches!(
            decode_message_pair("YQ==:Yg==:Yw=="),
            Err(CryptoError::Format(_))
        ));
        assert!(matches!(
            decode_private_key("Bw==:Aw==:BQ==:Ag==:Ag=="),
            Err(CryptoError::Format(_))
        ));
    }

    #[test]
    fn invalid_base64_is_format_error() {
        assert!(matches!(
            decode_message_pair("YQ==:!!!"),
            Err(CryptoError::Format(_))
        ));
        assert!(matches!(
            decode_public_key("YQ=:Yg==:Yw=="),
            Err(CryptoError::Format(_))
        ));
    }

    #[test]
    fn message_pair_shape() {
        assert_eq!(encode_message_pair(b"a", b"b"), "YQ==:Yg==");
        assert_eq!(encode_message_pair(b"", b""), ":");
        assert_eq!(decode_message_pair(":").unwrap(), (vec![], vec![]));
    }

    #[test]
    fn negative_component_is_range_error() {
        let err = PublicKey::from_signed(BigInt::from(7), BigInt::from(-3), BigInt::from(5))
            .unwrap_err();
        let CryptoError::Range(msg) = &err else {
            panic!("expected CryptoError::Range, got {err:?}");
        };
        assert!(msg.contains('g'));

        let err = PrivateKey::from_signed(
            BigInt::from(7),
            BigInt::from(3),
            BigInt::from(5),
            BigInt::from(-1),
        )
        .unwrap_err();
        assert!(matches!(err, CryptoError::Range(_)));
    }

    #[test]
    fn private_key_exposes_embedded_public_key() {
        let sk = PrivateKey::from_signed(7.into(), 3.into(), 5.into(), 2.into()).unwrap();
        let pk = sk.public_key();
        assert_eq!(pk.to_token(), "Bw==:Aw==:BQ==");
        assert_eq!(PublicKey::from_token(&pk.to_token()).unwrap(), pk);
    }

    #[test]
    fn private_key_debug_redacts_exponent() {
        let sk = PrivateKey::from_token("Bw==:Aw==:BQ==:Ag==").unwrap();
        assert!(format!("{sk:?}").contains("[REDACTED]"));
    }

    #[test]
    fn format_detection() {
        assert_eq!(
            TokenFormat::detect("xjq3OSMAji4=").unwrap(),
            TokenFormat::Legacy
        );
        assert_eq!(
            TokenFormat::detect("v2:AAAA:BBBB").unwrap(),
            TokenFormat::V2
        );
        assert!(matches!(
            TokenFormat::detect("v9:AAAA"),
            Err(CryptoError::Format(_))
        ));
    }
}
