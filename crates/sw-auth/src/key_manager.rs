use std::path::Path;
use std::sync::Arc;

use argon2::{
    Argon2, Params,
    password_hash::{PasswordHasher, SaltString},
};
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::crypto::StoreKey;
use crate::errors::{Result, SwAuthError};
use crate::secret::PassphraseProvider;

const SALT_LEN: usize = 32;

#[cfg(feature = "keyring-support")]
const KEYRING_SERVICE: &str = "steamward";
#[cfg(feature = "keyring-support")]
const KEYRING_ENTRY: &str = "sw-auth:v1";

/// Key-derivation metadata persisted next to the cookie files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyMeta {
    pub version: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Base64 Argon2id salt, present when a passphrase-derived key is in use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase_salt: Option<String>,
}

impl Default for KeyMeta {
    fn default() -> Self {
        Self {
            version: 1,
            created_at: chrono::Utc::now(),
            passphrase_salt: None,
        }
    }
}

/// Holds the store key, sourcing it from the OS keyring with an Argon2id
/// passphrase fallback.
pub struct KeyManager {
    meta: KeyMeta,
    key: StoreKey,
    passphrase_provider: Arc<dyn PassphraseProvider>,
}

impl KeyManager {
    #[cfg(feature = "keyring-support")]
    pub async fn new(
        storage_dir: &Path,
        passphrase_provider: Arc<dyn PassphraseProvider>,
    ) -> Result<Self> {
        let mut meta = Self::load_meta(storage_dir).await?;

        let key = match Self::load_from_keyring() {
            Ok(key) => {
                tracing::debug!("loaded store key from OS keyring");
                key
            }
            Err(e) => {
                tracing::debug!("keyring unavailable ({e}), deriving key from passphrase");
                let key = Self::derive_from_passphrase(&mut meta, &passphrase_provider).await?;
                if let Err(e) = Self::save_to_keyring(&key) {
                    tracing::warn!("could not save store key to keyring: {e}");
                }
                key
            }
        };

        Self::save_meta(storage_dir, &meta).await?;
        Ok(Self {
            meta,
            key,
            passphrase_provider,
        })
    }

    #[cfg(not(feature = "keyring-support"))]
    pub async fn new(
        storage_dir: &Path,
        passphrase_provider: Arc<dyn PassphraseProvider>,
    ) -> Result<Self> {
        let mut meta = Self::load_meta(storage_dir).await?;
        let key = Self::derive_from_passphrase(&mut meta, &passphrase_provider).await?;
        Self::save_meta(storage_dir, &meta).await?;
        Ok(Self {
            meta,
            key,
            passphrase_provider,
        })
    }

    pub fn key(&self) -> &StoreKey {
        &self.key
    }

    async fn load_meta(storage_dir: &Path) -> Result<KeyMeta> {
        let meta_path = storage_dir.join("meta.json");
        if meta_path.exists() {
            let content = fs::read_to_string(&meta_path).await?;
            serde_json::from_str(&content)
                .map_err(|e| SwAuthError::InvalidResponse(format!("invalid meta.json: {e}")))
        } else {
            Ok(KeyMeta::default())
        }
    }

    async fn save_meta(storage_dir: &Path, meta: &KeyMeta) -> Result<()> {
        let meta_json = serde_json::to_string_pretty(meta)?;
        fs::write(storage_dir.join("meta.json"), meta_json).await?;
        Ok(())
    }

    #[cfg(feature = "keyring-support")]
    fn load_from_keyring() -> Result<StoreKey> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_ENTRY)
            .map_err(|e| SwAuthError::Keyring(format!("failed to access keyring: {e}")))?;

        let key_b64 = entry
            .get_password()
            .map_err(|e| SwAuthError::Keyring(format!("failed to read from keyring: {e}")))?;

        let key_bytes = base64::engine::general_purpose::STANDARD
            .decode(key_b64)
            .map_err(|_| SwAuthError::CorruptedStore)?;
        if key_bytes.len() != 32 {
            return Err(SwAuthError::CorruptedStore);
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&key_bytes);
        Ok(StoreKey::from_bytes(key))
    }

    #[cfg(feature = "keyring-support")]
    fn save_to_keyring(key: &StoreKey) -> Result<()> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_ENTRY)
            .map_err(|e| SwAuthError::Keyring(format!("failed to access keyring: {e}")))?;
        let key_b64 = base64::engine::general_purpose::STANDARD.encode(key.as_bytes());
        entry
            .set_password(&key_b64)
            .map_err(|e| SwAuthError::Keyring(format!("failed to write to keyring: {e}")))?;
        Ok(())
    }

    /// Argon2id (m=64MiB, t=3, p=1) over the provider's passphrase.
    async fn derive_from_passphrase(
        meta: &mut KeyMeta,
        passphrase_provider: &Arc<dyn PassphraseProvider>,
    ) -> Result<StoreKey> {
        let salt = if let Some(ref salt_b64) = meta.passphrase_salt {
            base64::engine::general_purpose::STANDARD
                .decode(salt_b64)
                .map_err(|_| SwAuthError::CorruptedStore)?
        } else {
            let mut salt = vec![0u8; SALT_LEN];
            rand::rngs::OsRng.fill_bytes(&mut salt);
            meta.passphrase_salt =
                Some(base64::engine::general_purpose::STANDARD.encode(&salt));
            salt
        };

        let passphrase = passphrase_provider
            .passphrase("Unlock stored Steam session cookies")
            .await
            .ok_or(SwAuthError::PassphraseCancelled)?;

        let params = Params::new(65536, 3, 1, Some(32))
            .map_err(|e| SwAuthError::Crypto(format!("invalid Argon2 params: {e}")))?;
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let salt_string = SaltString::encode_b64(&salt)
            .map_err(|e| SwAuthError::Crypto(format!("invalid salt: {e}")))?;

        let hash = argon2
            .hash_password(passphrase.as_bytes(), &salt_string)
            .map_err(|e| SwAuthError::Crypto(format!("key derivation failed: {e}")))?;

        let key_bytes = hash
            .hash
            .ok_or_else(|| SwAuthError::Crypto("Argon2 produced no output".to_string()))?;
        if key_bytes.len() != 32 {
            return Err(SwAuthError::Crypto(format!(
                "expected 32 key bytes, got {}",
                key_bytes.len()
            )));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(key_bytes.as_bytes());
        Ok(StoreKey::from_bytes(key))
    }

    /// Install a fresh key; the caller re-encrypts existing data.
    ///
    /// Prefers a random key held by the OS keyring; without one the key is
    /// re-derived from the passphrase over a fresh salt so it stays
    /// recoverable across restarts.
    pub async fn rotate(&mut self, storage_dir: &Path) -> Result<()> {
        self.meta.created_at = chrono::Utc::now();

        #[cfg(feature = "keyring-support")]
        {
            let new_key = StoreKey::generate();
            match Self::save_to_keyring(&new_key) {
                Ok(()) => {
                    self.meta.passphrase_salt = None;
                    Self::save_meta(storage_dir, &self.meta).await?;
                    self.key = new_key;
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("keyring unavailable ({e}), rotating passphrase-derived key");
                }
            }
        }

        self.meta.passphrase_salt = None;
        let key =
            Self::derive_from_passphrase(&mut self.meta, &self.passphrase_provider).await?;
        Self::save_meta(storage_dir, &self.meta).await?;
        self.key = key;
        Ok(())
    }
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("meta", &self.meta)
            .field("key", &"[REDACTED]")
            .finish()
    }
}
