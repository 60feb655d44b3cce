use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use tokio::fs;
use tokio::sync::RwLock;

use crate::crypto::{self, SealedCookies};
use crate::errors::{Result, SwAuthError};
use crate::key_manager::KeyManager;
use crate::secret::PassphraseProvider;
use crate::session::CookieSet;
use crate::store::CookieStore;

/// File-based encrypted cookie store.
///
/// One encrypted JSON file per login, sealed with the key manager's store
/// key and bound to the login via AAD.
///
/// # Directory layout
/// ```text
/// ~/.config/steamward/sw-auth/
/// ├── meta.json          # key derivation metadata
/// ├── lock               # advisory lock file
/// └── logins/
///     ├── gabe.json      # sealed cookie set
///     └── alice.json
/// ```
#[derive(Debug)]
pub struct FileCookieStore {
    storage_dir: PathBuf,
    logins_dir: PathBuf,
    lock_file: PathBuf,
    key_manager: Arc<RwLock<KeyManager>>,
    cache: Arc<RwLock<HashMap<String, CookieSet>>>,
}

impl FileCookieStore {
    pub async fn new(
        storage_dir: impl AsRef<Path>,
        passphrase_provider: Arc<dyn PassphraseProvider>,
    ) -> Result<Self> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        let logins_dir = storage_dir.join("logins");
        let lock_file = storage_dir.join("lock");

        fs::create_dir_all(&storage_dir).await?;
        fs::create_dir_all(&logins_dir).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(&storage_dir, perms.clone())?;
            std::fs::set_permissions(&logins_dir, perms)?;
        }

        let key_manager = KeyManager::new(&storage_dir, passphrase_provider).await?;

        Ok(Self {
            storage_dir,
            logins_dir,
            lock_file,
            key_manager: Arc::new(RwLock::new(key_manager)),
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Default storage directory for the current platform
    pub fn default_storage_dir() -> Result<PathBuf> {
        let project_dirs = directories::ProjectDirs::from("", "", "steamward").ok_or_else(|| {
            SwAuthError::InvalidResponse("could not determine config directory".to_string())
        })?;
        Ok(project_dirs.config_dir().join("sw-auth"))
    }

    fn login_path(&self, login: &str) -> PathBuf {
        self.logins_dir.join(format!("{}.json", file_key(login)))
    }

    fn acquire_lock(&self) -> Result<std::fs::File> {
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(&self.lock_file)?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| SwAuthError::LockTimeout)?;
        Ok(lock_file)
    }

    async fn load_from_disk(&self, login: &str) -> Result<Option<CookieSet>> {
        let path = self.login_path(login);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let sealed: SealedCookies = serde_json::from_str(&content)
            .map_err(|_| SwAuthError::CorruptedStore)?;

        let key_manager = self.key_manager.read().await;
        let plaintext = crypto::open(key_manager.key(), &sealed, login)?;

        let cookies: CookieSet = serde_json::from_slice(&plaintext)
            .map_err(|_| SwAuthError::CorruptedStore)?;
        Ok(Some(cookies))
    }

    async fn save_to_disk(&self, login: &str, cookies: &CookieSet) -> Result<()> {
        let path = self.login_path(login);

        let plaintext = serde_json::to_vec(cookies)?;
        let key_manager = self.key_manager.read().await;
        let sealed = crypto::seal(key_manager.key(), &plaintext, login)?;
        let sealed_json = serde_json::to_string_pretty(&sealed)?;

        // Temp file plus rename keeps a crashed write from clobbering the
        // previous cookie set.
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, sealed_json).await?;
        let file = std::fs::File::open(&temp_path)?;
        file.sync_all()?;
        fs::rename(&temp_path, &path).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Logins with a stored cookie set
    pub async fn list_logins(&self) -> Vec<String> {
        let mut logins = Vec::new();

        let mut entries = match fs::read_dir(&self.logins_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("failed to read logins directory: {e}");
                return logins;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                logins.push(stem.to_string());
            }
        }

        logins
    }

    /// Rotate the store key and re-seal every login's cookies.
    pub async fn rotate_key(&self) -> Result<()> {
        let _lock = self.acquire_lock()?;

        let logins = self.list_logins().await;
        let mut all = Vec::new();
        for login in &logins {
            if let Some(cookies) = self.load_from_disk(login).await? {
                all.push((login.clone(), cookies));
            }
        }

        self.key_manager
            .write()
            .await
            .rotate(&self.storage_dir)
            .await?;

        for (login, cookies) in all {
            self.save_to_disk(&login, &cookies).await?;
        }

        self.cache.write().await.clear();
        Ok(())
    }

    async fn load_cached(&self, login: &str) -> Option<CookieSet> {
        {
            let cache = self.cache.read().await;
            if let Some(cookies) = cache.get(login) {
                return Some(cookies.clone());
            }
        }

        match self.load_from_disk(login).await {
            Ok(Some(cookies)) => {
                self.cache
                    .write()
                    .await
                    .insert(login.to_string(), cookies.clone());
                Some(cookies)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!("failed to load cookies for {login}: {e}");
                None
            }
        }
    }
}

/// Stable file name for a login; logins with characters unsafe in file
/// names fall back to a hex encoding.
fn file_key(login: &str) -> String {
    if !login.is_empty()
        && login
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        login.to_string()
    } else {
        hex::encode(login.as_bytes())
    }
}

#[async_trait::async_trait]
impl CookieStore for FileCookieStore {
    async fn get(&self, login: &str, domain: &str) -> HashMap<String, String> {
        match self.load_cached(login).await {
            Some(cookies) => cookies.get(domain).cloned().unwrap_or_default(),
            None => HashMap::new(),
        }
    }

    async fn set(&self, login: &str, cookies: &CookieSet) -> Result<()> {
        let _lock = self.acquire_lock()?;
        self.save_to_disk(login, cookies).await?;
        self.cache
            .write()
            .await
            .insert(login.to_string(), cookies.clone());
        Ok(())
    }

    async fn clear(&self, login: &str) -> Result<()> {
        let _lock = self.acquire_lock()?;
        let path = self.login_path(login);
        if path.exists() {
            fs::remove_file(&path).await?;
        }
        self.cache.write().await.remove(login);
        Ok(())
    }
}
