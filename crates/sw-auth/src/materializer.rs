use std::collections::HashMap;
use std::sync::Arc;

use rand::RngCore;
use reqwest::Client;
use reqwest::header::SET_COOKIE;
use tracing::{debug, instrument, warn};

use crate::config::{CookieDomain, SwAuthConfig, endpoints};
use crate::errors::{Result, SwAuthError, classify_response};
use crate::models::{FinalizeLoginResponse, TransferParams};
use crate::session::{CookieSet, SessionTokens};
use crate::store::CookieStore;

/// Exchanges handshake tokens for per-domain session cookies.
///
/// One finalize call on the login host, then one set-token exchange per
/// configured domain. Domain failures are independent: cookies already
/// obtained are kept and written through the store, and the combined error
/// reports which domains failed.
pub struct SessionMaterializer {
    http: Client,
    config: SwAuthConfig,
    store: Arc<dyn CookieStore>,
}

impl SessionMaterializer {
    pub fn new(http: Client, config: SwAuthConfig, store: Arc<dyn CookieStore>) -> Self {
        Self {
            http,
            config,
            store,
        }
    }

    /// Turn tokens into cookies on every configured domain and persist them
    /// keyed by login. Re-materializing overwrites the prior set.
    #[instrument(skip(self, tokens))]
    pub async fn materialize(&self, login: &str, tokens: &SessionTokens) -> Result<CookieSet> {
        let session_id = new_session_id();
        let finalize = self.finalize_login(tokens, &session_id).await?;

        let mut cookies = CookieSet::new();
        let mut failed = Vec::new();

        for domain in &self.config.domains {
            match self.set_token(domain, &finalize, tokens).await {
                Ok(mut domain_cookies) => {
                    domain_cookies.insert("sessionid".to_string(), session_id.clone());
                    cookies.insert_domain(&domain.name, domain_cookies);
                }
                Err(error) => {
                    warn!(domain = %domain.name, %error, "cookie exchange failed");
                    failed.push(domain.name.clone());
                }
            }
        }

        if !cookies.is_empty() {
            self.store.set(login, &cookies).await?;
        }

        if failed.is_empty() {
            debug!(domains = cookies.len(), "session materialized");
            Ok(cookies)
        } else {
            Err(SwAuthError::PartialMaterialization {
                succeeded: cookies.domains(),
                failed,
            })
        }
    }

    async fn finalize_login(
        &self,
        tokens: &SessionTokens,
        session_id: &str,
    ) -> Result<FinalizeLoginResponse> {
        let url = self.config.login_base.join(endpoints::FINALIZE_LOGIN)?;
        debug!("finalizing login for cookie transfer");
        let resp = self
            .http
            .post(url)
            .form(&[
                ("nonce", tokens.refresh_token.as_str()),
                ("sessionid", session_id),
                ("redir", self.config.login_base.as_str()),
            ])
            .send()
            .await?;
        let resp = classify_response(resp).await?;
        let finalize: FinalizeLoginResponse = resp.json().await?;
        if finalize.transfer_info.is_empty() {
            return Err(SwAuthError::InvalidResponse(
                "finalize login returned no transfer info".to_string(),
            ));
        }
        Ok(finalize)
    }

    async fn set_token(
        &self,
        domain: &CookieDomain,
        finalize: &FinalizeLoginResponse,
        tokens: &SessionTokens,
    ) -> Result<HashMap<String, String>> {
        let params = transfer_params_for(domain, finalize).ok_or_else(|| {
            SwAuthError::InvalidResponse(format!("no transfer info for {}", domain.name))
        })?;

        let steam_id = finalize
            .steam_id
            .as_deref()
            .unwrap_or(tokens.steam_id.as_str());

        let resp = self
            .http
            .post(domain.set_token_url.clone())
            .form(&[
                ("nonce", params.nonce.as_str()),
                ("auth", params.auth.as_str()),
                ("steamID", steam_id),
            ])
            .send()
            .await?;
        let resp = classify_response(resp).await?;

        let mut cookies = HashMap::new();
        for value in resp.headers().get_all(SET_COOKIE) {
            if let Some((name, value)) = parse_set_cookie(value.to_str().unwrap_or_default()) {
                cookies.insert(name, value);
            }
        }
        if cookies.is_empty() {
            return Err(SwAuthError::InvalidResponse(format!(
                "{} set no session cookies",
                domain.name
            )));
        }
        Ok(cookies)
    }
}

fn transfer_params_for<'a>(
    domain: &CookieDomain,
    finalize: &'a FinalizeLoginResponse,
) -> Option<&'a TransferParams> {
    finalize
        .transfer_info
        .iter()
        .find(|info| info.url == domain.set_token_url.as_str())
        .map(|info| &info.params)
}

/// Client-generated session id cookie value: 12 random bytes as hex.
fn new_session_id() -> String {
    let mut bytes = [0u8; 12];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// First `name=value` pair of a Set-Cookie header.
fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
