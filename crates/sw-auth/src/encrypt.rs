use base64::{Engine, engine::general_purpose::STANDARD};
use rsa::{BigUint, Pkcs1v15Encrypt, RsaPublicKey};

use crate::errors::{Result, SwAuthError};

/// Encrypt a password with the server's per-session RSA key.
///
/// `modulus_hex`/`exponent_hex` are the hex strings the key endpoint
/// returns. PKCS#1 v1.5 padding, standard base64 output. The
/// key-identifying timestamp travels alongside the ciphertext unchanged;
/// this function never sees it.
pub fn encrypt_password(password: &str, modulus_hex: &str, exponent_hex: &str) -> Result<String> {
    let n = BigUint::parse_bytes(modulus_hex.as_bytes(), 16)
        .ok_or_else(|| SwAuthError::Encryption("modulus is not valid hex".to_string()))?;
    let e = BigUint::parse_bytes(exponent_hex.as_bytes(), 16)
        .ok_or_else(|| SwAuthError::Encryption("exponent is not valid hex".to_string()))?;
    let key = RsaPublicKey::new(n, e)
        .map_err(|err| SwAuthError::Encryption(format!("malformed public key: {err}")))?;

    let mut rng = rand::thread_rng();
    let ciphertext = key
        .encrypt(&mut rng, Pkcs1v15Encrypt, password.as_bytes())
        .map_err(|err| SwAuthError::Encryption(format!("RSA encryption failed: {err}")))?;

    Ok(STANDARD.encode(ciphertext))
}
