#![allow(dead_code)]

use std::time::Duration;

use rsa::RsaPrivateKey;
use rsa::traits::PublicKeyParts;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sw_auth::SwAuthConfig;

pub const CLIENT_ID: &str = "334433";
pub const REQUEST_ID: &str = "cmVxdWVzdA==";
pub const STEAM_ID: &str = "76561198012345678";
pub const SHARED_SECRET: &str = "AAECAwQFBgcICQoLDA0ODxAREhM=";

pub const RSA_KEY_PATH: &str = "/IAuthenticationService/GetPasswordRSAPublicKey/v1/";
pub const BEGIN_AUTH_PATH: &str = "/IAuthenticationService/BeginAuthSessionViaCredentials/v1/";
pub const UPDATE_CODE_PATH: &str = "/IAuthenticationService/UpdateAuthSessionWithSteamGuardCode/v1/";
pub const POLL_STATUS_PATH: &str = "/IAuthenticationService/PollAuthSessionStatus/v1/";
pub const QUERY_TIME_PATH: &str = "/ITwoFactorService/QueryTime/v1/";
pub const FINALIZE_PATH: &str = "/jwt/finalizelogin";

/// Config rebased onto the mock server, with polling fast enough for tests.
pub fn test_config(server: &MockServer) -> SwAuthConfig {
    let base = Url::parse(&server.uri()).unwrap();
    let mut config = SwAuthConfig::single_host(&base).unwrap();
    config.poll.interval = Duration::from_millis(10);
    config.poll.max_attempts = 5;
    config
}

/// Serve a freshly generated RSA public key as hex modulus/exponent.
pub async fn mount_rsa_key(server: &MockServer) {
    let mut rng = rand::thread_rng();
    let key = RsaPrivateKey::new(&mut rng, 512).expect("test key generation");
    Mock::given(method("GET"))
        .and(path(RSA_KEY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {
                "publickey_mod": key.n().to_str_radix(16),
                "publickey_exp": key.e().to_str_radix(16),
                "timestamp": "123456789",
            }
        })))
        .mount(server)
        .await;
}

/// Begin-auth success naming the allowed confirmation types.
pub async fn mount_begin_auth(server: &MockServer, confirmation_types: &[i64]) {
    let confirmations: Vec<_> = confirmation_types
        .iter()
        .map(|t| json!({ "confirmation_type": t }))
        .collect();
    Mock::given(method("POST"))
        .and(path(BEGIN_AUTH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {
                "client_id": CLIENT_ID,
                "request_id": REQUEST_ID,
                "steamid": STEAM_ID,
                "allowed_confirmations": confirmations,
            }
        })))
        .mount(server)
        .await;
}

pub fn poll_confirmed_body() -> serde_json::Value {
    json!({
        "response": {
            "access_token": "test-access-token",
            "refresh_token": "test-refresh-token",
            "account_name": "gabe",
        }
    })
}

pub fn poll_pending_body() -> serde_json::Value {
    json!({ "response": {} })
}

/// A response carrying a failing EResult the way the platform reports it:
/// HTTP 200 with the code in a header.
pub fn eresult_response(code: i32, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("x-eresult", code.to_string().as_str())
        .insert_header("x-error_message", message)
        .set_body_json(json!({ "response": {} }))
}

/// Finalize-login transfer info covering every configured domain.
pub async fn mount_finalize(server: &MockServer, config: &SwAuthConfig) {
    let transfer_info: Vec<_> = config
        .domains
        .iter()
        .map(|domain| {
            json!({
                "url": domain.set_token_url.as_str(),
                "params": { "nonce": "transfer-nonce", "auth": "transfer-auth" },
            })
        })
        .collect();
    Mock::given(method("POST"))
        .and(path(FINALIZE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "steamID": STEAM_ID,
            "transfer_info": transfer_info,
        })))
        .mount(server)
        .await;
}

/// Set-token success for one domain, issuing a session cookie.
pub async fn mount_set_token(server: &MockServer, domain_name: &str, cookie_value: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/settoken/{domain_name}")))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "set-cookie",
                    format!("steamLoginSecure={cookie_value}; Path=/; Secure; HttpOnly").as_str(),
                )
                .set_body_json(json!({ "result": 1 })),
        )
        .mount(server)
        .await;
}

/// Set-token success for every configured domain.
pub async fn mount_all_set_tokens(server: &MockServer, config: &SwAuthConfig) {
    for domain in &config.domains {
        mount_set_token(server, &domain.name, &format!("token-{}", domain.name)).await;
    }
}
