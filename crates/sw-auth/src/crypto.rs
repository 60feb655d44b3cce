use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use zeroize::ZeroizeOnDrop;

use crate::errors::{Result, SwAuthError};

/// AES-256 key protecting cookie data at rest
#[derive(Clone, ZeroizeOnDrop)]
pub struct StoreKey {
    key: [u8; 32],
}

impl StoreKey {
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self { key }
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { key: bytes }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

impl std::fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StoreKey([REDACTED])")
    }
}

/// Encrypted payload persisted for one login
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SealedCookies {
    /// Base64url-encoded 96-bit nonce
    pub nonce: String,
    /// Base64url-encoded ciphertext + tag
    pub ciphertext: String,
    /// AAD format version
    pub aad_version: String,
}

fn aad_for(version: &str, login: &str) -> String {
    format!("sw-auth|{version}|{login}")
}

/// Seal a serialized cookie set under the store key.
///
/// The login is bound as AAD so a blob moved between login files fails
/// authentication on open.
pub fn seal(key: &StoreKey, plaintext: &[u8], login: &str) -> Result<SealedCookies> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let mut nonce_bytes = [0u8; 12];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let aad_version = "v1".to_string();
    let aad = aad_for(&aad_version, login);

    let ciphertext = cipher
        .encrypt(
            nonce,
            aes_gcm::aead::Payload {
                msg: plaintext,
                aad: aad.as_bytes(),
            },
        )
        .map_err(|e| SwAuthError::Crypto(format!("seal failed: {e}")))?;

    Ok(SealedCookies {
        nonce: URL_SAFE_NO_PAD.encode(nonce_bytes),
        ciphertext: URL_SAFE_NO_PAD.encode(ciphertext),
        aad_version,
    })
}

/// Open a sealed payload; any mismatch in key, login, or ciphertext reports
/// a corrupted store.
pub fn open(key: &StoreKey, sealed: &SealedCookies, login: &str) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());

    let nonce_bytes = URL_SAFE_NO_PAD
        .decode(&sealed.nonce)
        .map_err(|_| SwAuthError::CorruptedStore)?;
    if nonce_bytes.len() != 12 {
        return Err(SwAuthError::CorruptedStore);
    }
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = URL_SAFE_NO_PAD
        .decode(&sealed.ciphertext)
        .map_err(|_| SwAuthError::CorruptedStore)?;

    let aad = aad_for(&sealed.aad_version, login);

    cipher
        .decrypt(
            nonce,
            aes_gcm::aead::Payload {
                msg: &ciphertext,
                aad: aad.as_bytes(),
            },
        )
        .map_err(|_| SwAuthError::CorruptedStore)
}
