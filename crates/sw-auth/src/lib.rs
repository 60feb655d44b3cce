//! Steam web authentication for Rust clients
//!
//! This crate implements the credentialed login handshake against Steam's
//! web services and turns a successful handshake into per-domain session
//! cookies.
//!
//! # Login Flow
//!
//! A login runs through several steps:
//!
//! 1. Fetch the per-session RSA public key and encrypt the password
//! 2. Begin the auth session with the encrypted credentials
//! 3. Submit a Steam Guard code when the account requires one (generated
//!    locally from the shared secret, at server-synchronized time)
//! 4. Poll the session status until it is confirmed, denied, or expired
//! 5. Exchange the issued tokens for cookies on every platform web domain
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sw_auth::{AuthenticatorData, Credentials, MemoryCookieStore, SwAuthClient, SwAuthConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sw_auth::SwAuthError> {
//!     let store = Arc::new(MemoryCookieStore::new());
//!     let client = SwAuthClient::new(SwAuthConfig::steam()?, store)?;
//!
//!     let credentials = Credentials::new("account_name", "password");
//!     let authenticator = AuthenticatorData::new("base64-shared-secret");
//!
//!     let cookies = client.login(&credentials, Some(&authenticator)).await?;
//!     for domain in cookies.domains() {
//!         println!("session cookies for {domain}");
//!     }
//!
//!     // Later: check whether the stored session is still valid
//!     if !client.is_authorized("account_name").await? {
//!         // re-login
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Cookie Storage
//!
//! Sessions are persisted through the [`CookieStore`] trait, keyed by login
//! and domain. `get` tolerates missing entries by returning an empty map.
//!
//! ```
//! use sw_auth::{CookieSet, CookieStore, MemoryCookieStore};
//!
//! # async fn example() -> Result<(), sw_auth::SwAuthError> {
//! let store = MemoryCookieStore::new();
//!
//! let mut cookies = CookieSet::new();
//! cookies.insert("steamcommunity.com", "sessionid", "abc123");
//! store.set("account_name", &cookies).await?;
//!
//! let community = store.get("account_name", "steamcommunity.com").await;
//! assert_eq!(community["sessionid"], "abc123");
//! assert!(store.get("account_name", "help.steampowered.com").await.is_empty());
//! # Ok(())
//! # }
//! # tokio_test::block_on(example()).unwrap();
//! ```
//!
//! For production use, [`FileCookieStore`] seals each login's cookies with
//! AES-256-GCM; the key lives in the OS keyring (feature `keyring-support`,
//! on by default) with an Argon2id passphrase fallback.
//!
//! # Error Classification
//!
//! Remote failures arrive as numeric EResult codes and leave this crate as
//! typed [`SwAuthError`] values. The code-to-kind table is pre-populated
//! with the platform's known codes and can be extended through
//! [`register`]/[`register_overrides`] — register overrides before the
//! first login that should observe them.
//!
//! # Important Notes
//!
//! - Passwords, shared secrets, tokens, and cookie values are never logged;
//!   their holders have redacting `Debug` impls.
//! - One `login` call performs at most one handshake. Rate limits surface
//!   as [`SwAuthError::RateLimited`] and the caller decides when to retry.
//! - Dropping the `login` future cancels the handshake at the next await
//!   point; no partial tokens are ever returned.

pub mod client;
pub mod config;
pub mod crypto;
pub mod encrypt;
pub mod errors;
pub mod file_store;
pub mod guard;
pub mod key_manager;
pub mod materializer;
pub mod models;
pub mod secret;
pub mod session;
pub mod store;
pub mod time;

// Re-export main types
pub use client::{HandshakeState, SwAuthClient};
pub use config::{CookieDomain, HttpTimeouts, PollPolicy, SwAuthConfig};
pub use errors::{ErrorKind, Result, SwAuthError, map_eresult, register, register_overrides};
pub use file_store::FileCookieStore;
pub use guard::generate_code;
pub use materializer::SessionMaterializer;
pub use secret::{NoPassphrase, PassphraseProvider, StaticPassphrase};
pub use session::{AuthenticatorData, CookieSet, Credentials, SessionTokens};
pub use store::{CookieStore, MemoryCookieStore};
pub use time::TimeSync;
