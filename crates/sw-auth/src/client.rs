use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use crate::config::{SwAuthConfig, endpoints};
use crate::encrypt;
use crate::errors::{Result, SwAuthError, classify_response};
use crate::guard;
use crate::materializer::SessionMaterializer;
use crate::models::{
    ApiResponse, BeginAuthRequest, BeginAuthResponse, ConfirmationType, GUARD_CODE_TYPE_DEVICE,
    PollStatusRequest, PollStatusResponse, RsaKeyResponse, UpdateAuthRequest,
};
use crate::session::{AuthenticatorData, CookieSet, Credentials, SessionTokens};
use crate::store::CookieStore;
use crate::time::TimeSync;

/// Handshake progress; every login drives one pass through these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Idle,
    KeyFetched,
    CredentialsSubmitted,
    AwaitingConfirmation,
    Confirmed,
    Denied,
    Expired,
}

/// Identifiers of one pending auth session, alive between begin-auth and
/// the terminal poll.
struct HandshakeSession {
    client_id: String,
    request_id: String,
    steam_id: String,
    interval: Duration,
}

/// Main client for the credentialed Steam login handshake.
///
/// One handshake per `login` call: rate limits and denials are surfaced as
/// typed errors and the handshake is never internally retried, so a single
/// call performs at most one credential submission.
#[derive(Clone)]
pub struct SwAuthClient {
    config: SwAuthConfig,
    http: Client,
    time: Arc<TimeSync>,
    store: Arc<dyn CookieStore>,
}

impl SwAuthClient {
    /// Create a new authentication client
    pub fn new(config: SwAuthConfig, store: Arc<dyn CookieStore>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.http_timeouts.connect)
            .timeout(config.http_timeouts.request)
            .user_agent(config.user_agent.as_deref().unwrap_or("sw-auth"))
            .build()?;
        let time = Arc::new(TimeSync::new(
            http.clone(),
            config.api_base.join(endpoints::QUERY_TIME)?,
        ));

        Ok(Self {
            config,
            http,
            time,
            store,
        })
    }

    /// Run the full handshake and materialize session cookies.
    ///
    /// Exactly one typed error or a populated cookie set reaches the
    /// caller. Dropping the returned future (timeout, select) abandons the
    /// handshake at the next await point without yielding partial tokens.
    #[instrument(skip(self, credentials, authenticator), fields(login = %credentials.login))]
    pub async fn login(
        &self,
        credentials: &Credentials,
        authenticator: Option<&AuthenticatorData>,
    ) -> Result<CookieSet> {
        let tokens = self.run_handshake(credentials, authenticator).await?;
        let materializer = SessionMaterializer::new(
            self.http.clone(),
            self.config.clone(),
            self.store.clone(),
        );
        materializer
            .materialize(&credentials.login, &tokens)
            .await
    }

    /// Whether the stored cookies still hold a valid session, checked with
    /// a lightweight authenticated probe.
    #[instrument(skip(self))]
    pub async fn is_authorized(&self, login: &str) -> Result<bool> {
        let Some(domain) = self.config.domains.first() else {
            return Ok(false);
        };
        let cookies = self.store.get(login, &domain.name).await;
        if cookies.is_empty() {
            return Ok(false);
        }

        let cookie_header = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        let resp = self
            .http
            .get(self.config.probe_url.clone())
            .header(reqwest::header::COOKIE, cookie_header)
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    async fn run_handshake(
        &self,
        credentials: &Credentials,
        authenticator: Option<&AuthenticatorData>,
    ) -> Result<SessionTokens> {
        let mut state = HandshakeState::Idle;
        debug!(state = ?state, "starting handshake");

        let key = self.fetch_rsa_key(&credentials.login).await?;
        state = HandshakeState::KeyFetched;
        debug!(state = ?state, "per-session public key obtained");

        let encrypted = encrypt::encrypt_password(
            &credentials.password,
            &key.publickey_mod,
            &key.publickey_exp,
        )?;

        let begin = self
            .begin_auth(&credentials.login, &encrypted, &key.timestamp)
            .await?;
        state = HandshakeState::CredentialsSubmitted;
        debug!(state = ?state, "credentials submitted");

        let session = HandshakeSession {
            client_id: begin
                .client_id
                .clone()
                .ok_or_else(|| invalid("begin auth returned no client_id"))?,
            request_id: begin
                .request_id
                .clone()
                .ok_or_else(|| invalid("begin auth returned no request_id"))?,
            steam_id: begin
                .steamid
                .clone()
                .ok_or_else(|| invalid("begin auth returned no steamid"))?,
            interval: poll_interval(&begin, &self.config),
        };

        let allowed: Vec<ConfirmationType> = begin
            .allowed_confirmations
            .iter()
            .map(|c| c.confirmation_type)
            .collect();
        let code_requested = allowed.contains(&ConfirmationType::DeviceCode);
        let can_confirm_without_code = allowed.is_empty()
            || allowed.iter().any(|c| {
                matches!(
                    c,
                    ConfirmationType::None
                        | ConfirmationType::DeviceConfirmation
                        | ConfirmationType::EmailConfirmation
                )
            });

        if let (true, Some(auth)) = (code_requested, authenticator) {
            if let Err(error) = self.submit_guard_code(&session, auth).await {
                state = HandshakeState::Denied;
                debug!(state = ?state, "guard code rejected");
                return Err(error);
            }
            debug!("guard code accepted for confirmation");
        } else if !can_confirm_without_code {
            // Code-only confirmation (device or email) with no authenticator
            // configured: polling could never succeed.
            state = HandshakeState::Denied;
            warn!(state = ?state, "confirmation code required but no authenticator configured");
            return Err(SwAuthError::TwoFactorRequired);
        }

        state = HandshakeState::AwaitingConfirmation;
        debug!(state = ?state, interval = ?session.interval, "awaiting confirmation");

        let max_attempts = self.config.poll.max_attempts;
        for attempt in 1..=max_attempts {
            match self.poll_status(&session).await {
                Ok(Some(tokens)) => {
                    state = HandshakeState::Confirmed;
                    debug!(state = ?state, attempt, "login confirmed");
                    return Ok(tokens);
                }
                Ok(None) => {
                    debug!(attempt, max_attempts, "confirmation pending");
                    if attempt < max_attempts {
                        sleep(session.interval).await;
                    }
                }
                Err(error) => {
                    state = HandshakeState::Denied;
                    debug!(state = ?state, "authentication denied");
                    return Err(error);
                }
            }
        }

        state = HandshakeState::Expired;
        warn!(state = ?state, attempts = max_attempts, "confirmation polling exhausted");
        Err(SwAuthError::ConfirmationTimeout {
            attempts: max_attempts,
        })
    }

    /// Fetch the per-session RSA public key for an account
    #[instrument(skip(self))]
    async fn fetch_rsa_key(&self, login: &str) -> Result<RsaKeyResponse> {
        let url = self.config.api_base.join(endpoints::RSA_KEY)?;
        let resp = self
            .http
            .get(url)
            .query(&[("account_name", login)])
            .send()
            .await?;
        let resp = classify_response(resp).await?;
        let parsed: ApiResponse<RsaKeyResponse> = resp.json().await?;
        let key = parsed.response;
        if key.publickey_mod.is_empty() || key.publickey_exp.is_empty() {
            return Err(SwAuthError::KeyFetch(
                "server returned no public key".to_string(),
            ));
        }
        Ok(key)
    }

    /// Begin an auth session with the encrypted password
    #[instrument(skip(self, encrypted_password, encryption_timestamp))]
    async fn begin_auth(
        &self,
        login: &str,
        encrypted_password: &str,
        encryption_timestamp: &str,
    ) -> Result<BeginAuthResponse> {
        let url = self.config.api_base.join(endpoints::BEGIN_AUTH)?;
        let request = BeginAuthRequest {
            account_name: login.to_string(),
            encrypted_password: encrypted_password.to_string(),
            encryption_timestamp: encryption_timestamp.to_string(),
            persistence: 1,
            website_id: "Community".to_string(),
            device_friendly_name: self.config.device_friendly_name.clone(),
        };

        let resp = self.http.post(url).form(&request).send().await?;
        let resp = classify_response(resp).await?;
        let parsed: ApiResponse<BeginAuthResponse> = resp.json().await?;
        Ok(parsed.response)
    }

    /// Generate and submit an authenticator code for the pending session
    #[instrument(skip(self, session, authenticator))]
    async fn submit_guard_code(
        &self,
        session: &HandshakeSession,
        authenticator: &AuthenticatorData,
    ) -> Result<()> {
        let code = guard::generate_code(&authenticator.shared_secret, self.time.now().await)?;
        let url = self.config.api_base.join(endpoints::UPDATE_WITH_GUARD_CODE)?;
        let request = UpdateAuthRequest {
            client_id: session.client_id.clone(),
            steamid: session.steam_id.clone(),
            code,
            code_type: GUARD_CODE_TYPE_DEVICE,
        };

        let resp = self.http.post(url).form(&request).send().await?;
        classify_response(resp).await?;
        Ok(())
    }

    /// One status poll; `None` while the confirmation is still pending
    async fn poll_status(&self, session: &HandshakeSession) -> Result<Option<SessionTokens>> {
        let url = self.config.api_base.join(endpoints::POLL_STATUS)?;
        let request = PollStatusRequest {
            client_id: session.client_id.clone(),
            request_id: session.request_id.clone(),
        };

        let resp = self.http.post(url).form(&request).send().await?;
        let resp = classify_response(resp).await?;
        let parsed: ApiResponse<PollStatusResponse> = resp.json().await?;
        let poll = parsed.response;

        match poll.refresh_token {
            Some(refresh_token) if !refresh_token.is_empty() => Ok(Some(SessionTokens {
                steam_id: session.steam_id.clone(),
                access_token: poll.access_token.unwrap_or_default(),
                refresh_token,
            })),
            _ => Ok(None),
        }
    }
}

impl std::fmt::Debug for SwAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwAuthClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn invalid(message: &str) -> SwAuthError {
    SwAuthError::InvalidResponse(message.to_string())
}

/// Server-suggested poll interval, config fallback.
fn poll_interval(begin: &BeginAuthResponse, config: &SwAuthConfig) -> Duration {
    begin
        .interval
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(config.poll.interval)
}
