use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::errors::Result;
use crate::session::CookieSet;

/// Pluggable per-login cookie storage.
///
/// Backends own their concurrency discipline; access is keyed by login so
/// independent logins do not contend. `get` tolerates missing entries by
/// returning an empty map, never an error.
#[async_trait::async_trait]
pub trait CookieStore: Send + Sync {
    /// Cookies stored for one login+domain; empty when absent
    async fn get(&self, login: &str, domain: &str) -> HashMap<String, String>;

    /// Replace the stored cookie set for a login
    async fn set(&self, login: &str, cookies: &CookieSet) -> Result<()>;

    /// Drop everything stored for a login
    async fn clear(&self, login: &str) -> Result<()>;
}

/// In-memory cookie store for testing and simple embedders
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieStore {
    logins: Arc<RwLock<HashMap<String, CookieSet>>>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CookieStore for MemoryCookieStore {
    async fn get(&self, login: &str, domain: &str) -> HashMap<String, String> {
        self.logins
            .read()
            .ok()
            .and_then(|map| map.get(login).and_then(|set| set.get(domain).cloned()))
            .unwrap_or_default()
    }

    async fn set(&self, login: &str, cookies: &CookieSet) -> Result<()> {
        self.logins
            .write()
            .map_err(|_| crate::errors::SwAuthError::LockTimeout)?
            .insert(login.to_string(), cookies.clone());
        Ok(())
    }

    async fn clear(&self, login: &str) -> Result<()> {
        self.logins
            .write()
            .map_err(|_| crate::errors::SwAuthError::LockTimeout)?
            .remove(login);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cookies() -> CookieSet {
        let mut set = CookieSet::new();
        set.insert("steamcommunity.com", "sessionid", "abc");
        set.insert("steamcommunity.com", "steamLoginSecure", "tok");
        set.insert("store.steampowered.com", "sessionid", "abc");
        set
    }

    #[tokio::test]
    async fn round_trips_per_domain() {
        let store = MemoryCookieStore::new();
        store.set("gabe", &sample_cookies()).await.unwrap();

        let community = store.get("gabe", "steamcommunity.com").await;
        assert_eq!(community.len(), 2);
        assert_eq!(community["steamLoginSecure"], "tok");
    }

    #[tokio::test]
    async fn absent_entries_yield_empty_maps() {
        let store = MemoryCookieStore::new();
        assert!(store.get("nobody", "steamcommunity.com").await.is_empty());

        store.set("gabe", &sample_cookies()).await.unwrap();
        assert!(store.get("gabe", "unknown.example").await.is_empty());
    }

    #[tokio::test]
    async fn set_replaces_the_previous_cookie_set() {
        let store = MemoryCookieStore::new();
        store.set("gabe", &sample_cookies()).await.unwrap();

        let mut fresh = CookieSet::new();
        fresh.insert("steamcommunity.com", "sessionid", "new");
        store.set("gabe", &fresh).await.unwrap();

        let community = store.get("gabe", "steamcommunity.com").await;
        assert_eq!(community.len(), 1);
        assert_eq!(community["sessionid"], "new");
        assert!(store.get("gabe", "store.steampowered.com").await.is_empty());
    }

    #[tokio::test]
    async fn clear_removes_the_login() {
        let store = MemoryCookieStore::new();
        store.set("gabe", &sample_cookies()).await.unwrap();
        store.clear("gabe").await.unwrap();
        assert!(store.get("gabe", "steamcommunity.com").await.is_empty());
    }
}
