use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Account name and password for the credentialed login handshake.
///
/// Immutable once a handshake begins. The password is zeroized on drop and
/// never leaves the process in plaintext; it is RSA-encrypted before being
/// submitted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    #[zeroize(skip)]
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Shared secret enabling local generation of Steam Guard codes.
///
/// The secret is the base64 string a mobile authenticator enrollment hands
/// out. Caller-owned, read-only input to code generation.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AuthenticatorData {
    pub shared_secret: String,
}

impl AuthenticatorData {
    pub fn new(shared_secret: impl Into<String>) -> Self {
        Self {
            shared_secret: shared_secret.into(),
        }
    }
}

impl std::fmt::Debug for AuthenticatorData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthenticatorData([REDACTED])")
    }
}

/// Opaque tokens proving a completed handshake.
///
/// Short-lived: produced by a confirmed handshake and consumed exactly once
/// by session materialization.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub steam_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("steam_id", &self.steam_id)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Per-domain session cookies for one login.
///
/// Maps a web domain to its cookie name/value pairs. Every domain key
/// corresponds to a configured platform endpoint. Cookie values are session
/// credentials; the `Debug` impl shows domains and cookie names only.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct CookieSet {
    domains: HashMap<String, HashMap<String, String>>,
}

impl CookieSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single cookie for a domain.
    pub fn insert(
        &mut self,
        domain: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.domains
            .entry(domain.into())
            .or_default()
            .insert(name.into(), value.into());
    }

    /// Replace all cookies for a domain.
    pub fn insert_domain(&mut self, domain: impl Into<String>, cookies: HashMap<String, String>) {
        self.domains.insert(domain.into(), cookies);
    }

    /// Cookies for a domain, if any were materialized.
    pub fn get(&self, domain: &str) -> Option<&HashMap<String, String>> {
        self.domains.get(domain)
    }

    /// Domains present in the set, sorted for stable reporting.
    pub fn domains(&self) -> Vec<String> {
        let mut names: Vec<String> = self.domains.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HashMap<String, String>)> {
        self.domains.iter()
    }
}

impl std::fmt::Debug for CookieSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (domain, cookies) in &self.domains {
            let mut names: Vec<&String> = cookies.keys().collect();
            names.sort();
            map.entry(domain, &names);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_set_insert_and_get() {
        let mut set = CookieSet::new();
        set.insert("steamcommunity.com", "sessionid", "abc123");
        set.insert("steamcommunity.com", "steamLoginSecure", "tok");
        set.insert("store.steampowered.com", "sessionid", "abc123");

        let community = set.get("steamcommunity.com").unwrap();
        assert_eq!(community.len(), 2);
        assert_eq!(community["sessionid"], "abc123");
        assert!(set.get("help.steampowered.com").is_none());
        assert_eq!(
            set.domains(),
            vec!["steamcommunity.com", "store.steampowered.com"]
        );
    }

    #[test]
    fn cookie_set_debug_hides_values() {
        let mut set = CookieSet::new();
        set.insert("steamcommunity.com", "steamLoginSecure", "supersecret");
        let rendered = format!("{set:?}");
        assert!(rendered.contains("steamLoginSecure"));
        assert!(!rendered.contains("supersecret"));
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("gabe", "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("gabe"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn tokens_debug_hides_token_material() {
        let tokens = SessionTokens {
            steam_id: "76561198000000000".to_string(),
            access_token: "eyAccess".to_string(),
            refresh_token: "eyRefresh".to_string(),
        };
        let rendered = format!("{tokens:?}");
        assert!(rendered.contains("76561198000000000"));
        assert!(!rendered.contains("eyAccess"));
        assert!(!rendered.contains("eyRefresh"));
    }
}
