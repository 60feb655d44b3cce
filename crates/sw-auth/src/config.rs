use std::time::Duration;

use url::Url;

use crate::errors::Result;

/// Steam web API paths
pub mod endpoints {
    pub const API_BASE: &str = "https://api.steampowered.com";
    pub const LOGIN_BASE: &str = "https://login.steampowered.com";

    pub const RSA_KEY: &str = "/IAuthenticationService/GetPasswordRSAPublicKey/v1/";
    pub const BEGIN_AUTH: &str = "/IAuthenticationService/BeginAuthSessionViaCredentials/v1/";
    pub const UPDATE_WITH_GUARD_CODE: &str =
        "/IAuthenticationService/UpdateAuthSessionWithSteamGuardCode/v1/";
    pub const POLL_STATUS: &str = "/IAuthenticationService/PollAuthSessionStatus/v1/";
    pub const QUERY_TIME: &str = "/ITwoFactorService/QueryTime/v1/";

    pub const FINALIZE_LOGIN: &str = "/jwt/finalizelogin";
    pub const SET_TOKEN: &str = "/login/settoken";
}

/// Platform web domains that receive session cookies
pub mod domains {
    pub const COMMUNITY: &str = "steamcommunity.com";
    pub const STORE: &str = "store.steampowered.com";
    pub const HELP: &str = "help.steampowered.com";
}

/// A web domain participating in session materialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieDomain {
    /// Domain name used as the cookie-set and store key
    pub name: String,
    /// Set-token endpoint on that domain
    pub set_token_url: Url,
}

impl CookieDomain {
    pub fn new(name: impl Into<String>, set_token_url: Url) -> Self {
        Self {
            name: name.into(),
            set_token_url,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            request: Duration::from_secs(30),
        }
    }
}

/// Confirmation polling configuration.
///
/// The timeout bound is the attempt count; wall-clock bounding beyond that
/// is the caller's cancellation (drop the login future).
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Maximum status polls before the handshake expires
    pub max_attempts: u32,
    /// Delay between polls when the server does not dictate one
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 12,
            interval: Duration::from_secs(5),
        }
    }
}

/// Configuration for SwAuthClient
#[derive(Debug, Clone)]
pub struct SwAuthConfig {
    /// Base URL of the authentication API host
    pub api_base: Url,

    /// Base URL of the login host (finalize exchange)
    pub login_base: Url,

    /// Domains that receive cookies, in materialization order
    pub domains: Vec<CookieDomain>,

    /// Authenticated endpoint probed by `is_authorized`; must answer
    /// non-success when the presented cookies no longer hold a session
    pub probe_url: Url,

    /// HTTP client timeouts
    pub http_timeouts: HttpTimeouts,

    /// Confirmation polling policy
    pub poll: PollPolicy,

    /// Custom user agent (optional)
    pub user_agent: Option<String>,

    /// Device name reported when beginning an auth session
    pub device_friendly_name: String,
}

impl SwAuthConfig {
    /// Config against the production Steam hosts.
    pub fn steam() -> Result<Self> {
        let api_base = Url::parse(endpoints::API_BASE)?;
        let login_base = Url::parse(endpoints::LOGIN_BASE)?;
        let domain_list = [domains::COMMUNITY, domains::STORE, domains::HELP]
            .into_iter()
            .map(|name| {
                let url = Url::parse(&format!("https://{name}{}", endpoints::SET_TOKEN))?;
                Ok(CookieDomain::new(name, url))
            })
            .collect::<Result<Vec<_>>>()?;
        let probe_url = Url::parse(&format!("https://{}/my/home", domains::COMMUNITY))?;

        Ok(Self {
            api_base,
            login_base,
            domains: domain_list,
            probe_url,
            http_timeouts: HttpTimeouts::default(),
            poll: PollPolicy::default(),
            user_agent: Some("sw-auth".to_string()),
            device_friendly_name: "sw-auth client".to_string(),
        })
    }

    /// Config with every endpoint rebased onto one host.
    ///
    /// Domain names keep their production values while their set-token
    /// endpoints move to `{base}/settoken/{name}`; used against self-hosted
    /// or mock servers.
    pub fn single_host(base: &Url) -> Result<Self> {
        let domain_list = [domains::COMMUNITY, domains::STORE, domains::HELP]
            .into_iter()
            .map(|name| {
                let url = base.join(&format!("/settoken/{name}"))?;
                Ok(CookieDomain::new(name, url))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            api_base: base.clone(),
            login_base: base.clone(),
            domains: domain_list,
            probe_url: base.join("/probe")?,
            http_timeouts: HttpTimeouts::default(),
            poll: PollPolicy::default(),
            user_agent: Some("sw-auth".to_string()),
            device_friendly_name: "sw-auth client".to_string(),
        })
    }

    /// Add a domain beyond the built-in community/store/help set.
    pub fn with_extra_domain(mut self, domain: CookieDomain) -> Self {
        self.domains.push(domain);
        self
    }
}

impl Default for SwAuthConfig {
    fn default() -> Self {
        // Static production URLs parse unconditionally.
        Self::steam().expect("production endpoint URLs are valid")
    }
}
