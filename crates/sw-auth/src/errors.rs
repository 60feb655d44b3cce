use std::collections::HashMap;
use std::sync::{LazyLock, RwLock};

use thiserror::Error;

/// Steam web authentication error types
#[derive(Error, Debug)]
pub enum SwAuthError {
    #[error("RSA public key fetch failed: {0}")]
    KeyFetch(String),

    #[error("password encryption failed: {0}")]
    Encryption(String),

    #[error("shared secret is not valid base64")]
    InvalidSharedSecret,

    #[error("invalid account name or password")]
    InvalidCredentials,

    #[error("account requires a Steam Guard code but no authenticator is configured")]
    TwoFactorRequired,

    #[error("Steam Guard code was rejected")]
    InvalidTwoFactorCode,

    #[error("login confirmation timed out after {attempts} poll attempts")]
    ConfirmationTimeout { attempts: u32 },

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("cookie exchange failed for domains {failed:?} (obtained: {succeeded:?})")]
    PartialMaterialization {
        succeeded: Vec<String>,
        failed: Vec<String>,
    },

    #[error("steam error {code}: {message}")]
    Steam { code: i32, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP error {status}: {body_snippet}")]
    Http {
        status: reqwest::StatusCode,
        body_snippet: String,
    },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("crypto failure: {0}")]
    Crypto(String),

    #[error("stored cookie data is corrupted or was tampered with")]
    CorruptedStore,

    #[error("could not acquire store lock")]
    LockTimeout,

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("passphrase entry cancelled")]
    PassphraseCancelled,
}

pub type Result<T> = std::result::Result<T, SwAuthError>;

/// Classified category of a remote failure, distinct from its wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidCredentials,
    TwoFactorRequired,
    InvalidTwoFactorCode,
    RateLimited,
}

// EResult values Steam reports for login failures.
const ERESULT_OK: i32 = 1;
const ERESULT_INVALID_PASSWORD: i32 = 5;
const ERESULT_ACCOUNT_LOGON_DENIED: i32 = 63;
const ERESULT_INVALID_LOGIN_AUTH_CODE: i32 = 65;
const ERESULT_RATE_LIMIT_EXCEEDED: i32 = 84;
const ERESULT_NEED_TWO_FACTOR: i32 = 85;
const ERESULT_TWO_FACTOR_MISMATCH: i32 = 88;

static REGISTRY: LazyLock<RwLock<HashMap<i32, ErrorKind>>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert(ERESULT_INVALID_PASSWORD, ErrorKind::InvalidCredentials);
    map.insert(ERESULT_ACCOUNT_LOGON_DENIED, ErrorKind::TwoFactorRequired);
    map.insert(
        ERESULT_INVALID_LOGIN_AUTH_CODE,
        ErrorKind::InvalidTwoFactorCode,
    );
    map.insert(ERESULT_RATE_LIMIT_EXCEEDED, ErrorKind::RateLimited);
    map.insert(ERESULT_NEED_TWO_FACTOR, ErrorKind::TwoFactorRequired);
    map.insert(ERESULT_TWO_FACTOR_MISMATCH, ErrorKind::InvalidTwoFactorCode);
    RwLock::new(map)
});

/// Map a code to an error kind for every future classification.
///
/// Last writer wins. Register overrides before the first login attempt that
/// should observe them; concurrent registration and classification are safe
/// but give no ordering guarantee.
pub fn register(code: i32, kind: ErrorKind) {
    if let Ok(mut map) = REGISTRY.write() {
        map.insert(code, kind);
    }
}

/// Bulk registration of code overrides.
pub fn register_overrides(overrides: impl IntoIterator<Item = (i32, ErrorKind)>) {
    if let Ok(mut map) = REGISTRY.write() {
        for (code, kind) in overrides {
            map.insert(code, kind);
        }
    }
}

/// Translate a remote EResult into a typed error.
///
/// Unmapped codes fall back to [`SwAuthError::Steam`] carrying the raw code
/// and message.
pub fn map_eresult(code: i32, message: impl Into<String>) -> SwAuthError {
    let kind = REGISTRY
        .read()
        .ok()
        .and_then(|map| map.get(&code).copied());
    match kind {
        Some(ErrorKind::InvalidCredentials) => SwAuthError::InvalidCredentials,
        Some(ErrorKind::TwoFactorRequired) => SwAuthError::TwoFactorRequired,
        Some(ErrorKind::InvalidTwoFactorCode) => SwAuthError::InvalidTwoFactorCode,
        Some(ErrorKind::RateLimited) => SwAuthError::RateLimited,
        None => SwAuthError::Steam {
            code,
            message: message.into(),
        },
    }
}

/// Check a remote response for protocol-level failure before decoding it.
///
/// Steam reports failures through `x-eresult`/`x-error_message` headers even
/// on HTTP 200; those take precedence over the status code so that every
/// remote failure crosses this boundary as a classified error.
pub(crate) async fn classify_response(resp: reqwest::Response) -> Result<reqwest::Response> {
    if let Some(value) = resp.headers().get("x-eresult") {
        let code = value
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<i32>().ok());
        match code {
            Some(code) if code != ERESULT_OK => {
                let message = resp
                    .headers()
                    .get("x-error_message")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                return Err(map_eresult(code, message));
            }
            Some(_) => return Ok(resp),
            None => {
                return Err(SwAuthError::InvalidResponse(
                    "unparseable x-eresult header".to_string(),
                ));
            }
        }
    }

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(SwAuthError::Http {
            status,
            body_snippet: body.chars().take(200).collect(),
        });
    }

    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mapping_classifies_known_codes() {
        assert!(matches!(
            map_eresult(5, "denied"),
            SwAuthError::InvalidCredentials
        ));
        assert!(matches!(map_eresult(84, ""), SwAuthError::RateLimited));
        assert!(matches!(
            map_eresult(88, ""),
            SwAuthError::InvalidTwoFactorCode
        ));
        assert!(matches!(
            map_eresult(85, ""),
            SwAuthError::TwoFactorRequired
        ));
    }

    #[test]
    fn unmapped_code_falls_back_to_generic() {
        match map_eresult(9999, "something new") {
            SwAuthError::Steam { code, message } => {
                assert_eq!(code, 9999);
                assert_eq!(message, "something new");
            }
            other => panic!("expected generic fallback, got {other:?}"),
        }
    }

    #[test]
    fn registered_override_wins() {
        // 7777 is unused by the built-in table; avoids interference with
        // other tests sharing the process-wide registry.
        assert!(matches!(
            map_eresult(7777, "x"),
            SwAuthError::Steam { code: 7777, .. }
        ));
        register(7777, ErrorKind::RateLimited);
        assert!(matches!(map_eresult(7777, "x"), SwAuthError::RateLimited));
        register(7777, ErrorKind::InvalidCredentials);
        assert!(matches!(
            map_eresult(7777, "x"),
            SwAuthError::InvalidCredentials
        ));
    }

    #[test]
    fn bulk_registration_applies_all() {
        register_overrides([
            (8801, ErrorKind::TwoFactorRequired),
            (8802, ErrorKind::RateLimited),
        ]);
        assert!(matches!(
            map_eresult(8801, ""),
            SwAuthError::TwoFactorRequired
        ));
        assert!(matches!(map_eresult(8802, ""), SwAuthError::RateLimited));
    }
}
