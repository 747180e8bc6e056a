//! Block padding.
//!
//! Legacy tokens pad with NUL bytes and strip every trailing NUL on the way
//! back, so payloads that end in NUL lose those bytes. Current tokens use
//! PKCS#7, which is unambiguous.

use zeroize::Zeroizing;

/// Appends NUL bytes up to the next multiple of `block`. Already aligned input
/// (including empty input) gets no padding.
pub(crate) fn pad_nul(data: &[u8], block: usize) -> Zeroizing<Vec<u8>> {
    let pad = (block - data.len() % block) % block;
    let mut out = Zeroizing::new(Vec::with_capacity(data.len() + pad));
    out.extend_from_slice(data);
    out.resize(data.len() + pad, 0);
    out
}

/// Removes every trailing NUL byte.
pub(crate) fn strip_nul(buf: &mut Vec<u8>) {
    let end = buf.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    buf.truncate(end);
}

/// PKCS#7: always appends between 1 and `block` bytes, each equal to the pad length.
pub(crate) fn pad_pkcs7(data: &[u8], block: usize) -> Zeroizing<Vec<u8>> {
    debug_assert!(block > 0 && block <= u8::MAX as usize);
    let pad = block - data.len() % block;
    let mut out = Zeroizing::new(Vec::with_capacity(data.len() + pad));
    out.extend_from_slice(data);
    out.resize(data.len() + pad, pad as u8);
    out
}

/// Reverses [`pad_pkcs7`]. Returns `None` if the padding is malformed.
pub(crate) fn unpad_pkcs7(buf: &mut Vec<u8>, block: usize) -> Option<()> {
    if buf.is_empty() || buf.len() % block != 0 {
        return None;
    }
    let pad = *buf.last()? as usize;
    if pad == 0 || pad > block {
        return None;
    }
    let start = buf.len() - pad;
    if buf[start..].iter().any(|&b| b as usize != pad) {
        return None;
    }
    buf.truncate(start);
    Some(())
}
