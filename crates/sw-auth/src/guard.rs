use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::errors::{Result, SwAuthError};

type HmacSha1 = Hmac<Sha1>;

/// Code alphabet: digits and uppercase letters minus ambiguous characters.
const CODE_ALPHABET: &[u8; 26] = b"23456789BCDFGHJKMNPQRTVWXY";
const CODE_LEN: usize = 5;

/// Seconds per code window
pub const TIME_STEP: u64 = 30;

/// Generate a Steam Guard code for a unix timestamp.
///
/// Pure function: HMAC-SHA1 over the big-endian 30-second counter, dynamic
/// offset from the low nibble of the final hash byte, 31-bit truncation,
/// then five base-26 characters over the fixed alphabet, least significant
/// first. `timestamp` should already be server-adjusted (see
/// [`TimeSync`](crate::time::TimeSync)).
pub fn generate_code(shared_secret: &str, timestamp: u64) -> Result<String> {
    let key = STANDARD
        .decode(shared_secret.trim())
        .map_err(|_| SwAuthError::InvalidSharedSecret)?;
    if key.is_empty() {
        return Err(SwAuthError::InvalidSharedSecret);
    }

    let counter = (timestamp / TIME_STEP).to_be_bytes();
    let mut mac =
        HmacSha1::new_from_slice(&key).map_err(|_| SwAuthError::InvalidSharedSecret)?;
    mac.update(&counter);
    let digest = mac.finalize().into_bytes();

    // Low nibble of the last byte picks a 4-byte window inside the digest.
    let offset = (digest[19] & 0x0f) as usize;
    let mut value = u32::from_be_bytes([
        digest[offset],
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]) & 0x7fff_ffff;

    let mut code = String::with_capacity(CODE_LEN);
    for _ in 0..CODE_LEN {
        code.push(CODE_ALPHABET[(value as usize) % CODE_ALPHABET.len()] as char);
        value /= CODE_ALPHABET.len() as u32;
    }
    Ok(code)
}
