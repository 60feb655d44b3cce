//! Session materialization tests: token-for-cookie exchanges per domain.

use std::sync::Arc;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sw_auth::{
    CookieStore, MemoryCookieStore, SessionMaterializer, SessionTokens, SwAuthError,
};

mod support;
use support::*;

fn test_tokens() -> SessionTokens {
    SessionTokens {
        steam_id: STEAM_ID.to_string(),
        access_token: "test-access-token".to_string(),
        refresh_token: "test-refresh-token".to_string(),
    }
}

fn materializer_against(
    server: &MockServer,
    store: Arc<MemoryCookieStore>,
) -> SessionMaterializer {
    SessionMaterializer::new(reqwest::Client::new(), test_config(server), store)
}

#[tokio::test]
async fn all_domains_succeed_and_are_stored() {
    let server = MockServer::start().await;
    let config = test_config(&server);
    mount_finalize(&server, &config).await;
    mount_all_set_tokens(&server, &config).await;

    let store = Arc::new(MemoryCookieStore::new());
    let materializer = materializer_against(&server, store.clone());
    let cookies = materializer
        .materialize("gabe", &test_tokens())
        .await
        .unwrap();

    assert_eq!(cookies.len(), config.domains.len());
    for domain in &config.domains {
        let stored = store.get("gabe", &domain.name).await;
        assert_eq!(
            stored["steamLoginSecure"],
            format!("token-{}", domain.name)
        );
        assert!(stored.contains_key("sessionid"));
    }
}

#[tokio::test]
async fn one_failing_domain_does_not_cancel_the_others() {
    let server = MockServer::start().await;
    let config = test_config(&server);
    mount_finalize(&server, &config).await;
    mount_set_token(&server, "steamcommunity.com", "community-token").await;
    mount_set_token(&server, "help.steampowered.com", "help-token").await;
    Mock::given(method("POST"))
        .and(path("/settoken/store.steampowered.com"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCookieStore::new());
    let materializer = materializer_against(&server, store.clone());
    let result = materializer.materialize("gabe", &test_tokens()).await;

    match result {
        Err(SwAuthError::PartialMaterialization { succeeded, failed }) => {
            assert_eq!(failed, vec!["store.steampowered.com"]);
            assert_eq!(
                succeeded,
                vec!["help.steampowered.com", "steamcommunity.com"]
            );
        }
        other => panic!("expected partial materialization, got {other:?}"),
    }

    // Cookies for the surviving domains were still written through.
    let community = store.get("gabe", "steamcommunity.com").await;
    assert_eq!(community["steamLoginSecure"], "community-token");
    assert!(store.get("gabe", "store.steampowered.com").await.is_empty());
}

#[tokio::test]
async fn classified_finalize_failure_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FINALIZE_PATH))
        .respond_with(eresult_response(84, "RateLimitExceeded"))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCookieStore::new());
    let materializer = materializer_against(&server, store.clone());
    let result = materializer.materialize("gabe", &test_tokens()).await;

    assert!(matches!(result, Err(SwAuthError::RateLimited)));
    assert!(store.get("gabe", "steamcommunity.com").await.is_empty());
}

#[tokio::test]
async fn missing_transfer_info_counts_as_domain_failure() {
    let server = MockServer::start().await;
    let config = test_config(&server);

    // Finalize covers every domain except help.
    let transfer_info: Vec<_> = config
        .domains
        .iter()
        .filter(|d| d.name != "help.steampowered.com")
        .map(|domain| {
            serde_json::json!({
                "url": domain.set_token_url.as_str(),
                "params": { "nonce": "transfer-nonce", "auth": "transfer-auth" },
            })
        })
        .collect();
    Mock::given(method("POST"))
        .and(path(FINALIZE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "steamID": STEAM_ID,
            "transfer_info": transfer_info,
        })))
        .mount(&server)
        .await;
    mount_all_set_tokens(&server, &config).await;

    let store = Arc::new(MemoryCookieStore::new());
    let materializer = materializer_against(&server, store.clone());
    let result = materializer.materialize("gabe", &test_tokens()).await;

    match result {
        Err(SwAuthError::PartialMaterialization { succeeded, failed }) => {
            assert_eq!(failed, vec!["help.steampowered.com"]);
            assert_eq!(
                succeeded,
                vec!["steamcommunity.com", "store.steampowered.com"]
            );
        }
        other => panic!("expected partial materialization, got {other:?}"),
    }
}

#[tokio::test]
async fn exchange_without_cookies_counts_as_domain_failure() {
    let server = MockServer::start().await;
    let config = test_config(&server);
    mount_finalize(&server, &config).await;
    mount_set_token(&server, "steamcommunity.com", "community-token").await;
    mount_set_token(&server, "store.steampowered.com", "store-token").await;
    // 200 but no Set-Cookie header.
    Mock::given(method("POST"))
        .and(path("/settoken/help.steampowered.com"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": 1 })),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCookieStore::new());
    let materializer = materializer_against(&server, store.clone());
    let result = materializer.materialize("gabe", &test_tokens()).await;

    match result {
        Err(SwAuthError::PartialMaterialization { failed, .. }) => {
            assert_eq!(failed, vec!["help.steampowered.com"]);
        }
        other => panic!("expected partial materialization, got {other:?}"),
    }
}

#[tokio::test]
async fn rematerializing_overwrites_the_previous_cookie_set() {
    let server = MockServer::start().await;
    let config = test_config(&server);
    mount_finalize(&server, &config).await;

    // First exchange hands out "stale" cookies, later ones "fresh".
    for domain in &config.domains {
        Mock::given(method("POST"))
            .and(path(format!("/settoken/{}", domain.name)))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "steamLoginSecure=stale; Path=/; Secure")
                    .set_body_json(serde_json::json!({ "result": 1 })),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }
    for domain in &config.domains {
        mount_set_token(&server, &domain.name, "fresh").await;
    }

    let store = Arc::new(MemoryCookieStore::new());
    let materializer = materializer_against(&server, store.clone());

    materializer.materialize("gabe", &test_tokens()).await.unwrap();
    let first = store.get("gabe", "steamcommunity.com").await;
    assert_eq!(first["steamLoginSecure"], "stale");

    materializer.materialize("gabe", &test_tokens()).await.unwrap();
    let second = store.get("gabe", "steamcommunity.com").await;
    assert_eq!(second["steamLoginSecure"], "fresh");
}
