use serde::{Deserialize, Serialize};

/// Envelope wrapping every authentication API response body
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub response: T,
}

/// GetPasswordRSAPublicKey response
#[derive(Debug, Clone, Deserialize)]
pub struct RsaKeyResponse {
    #[serde(default)]
    pub publickey_mod: String,
    #[serde(default)]
    pub publickey_exp: String,
    /// Server-assigned key timestamp, echoed back verbatim on begin-auth
    #[serde(default)]
    pub timestamp: String,
}

/// BeginAuthSessionViaCredentials request
#[derive(Debug, Clone, Serialize)]
pub struct BeginAuthRequest {
    pub account_name: String,
    pub encrypted_password: String,
    pub encryption_timestamp: String,
    pub persistence: i32,
    pub website_id: String,
    pub device_friendly_name: String,
}

/// BeginAuthSessionViaCredentials response
#[derive(Debug, Clone, Deserialize)]
pub struct BeginAuthResponse {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub steamid: Option<String>,
    /// Server-suggested seconds between status polls
    #[serde(default)]
    pub interval: Option<f64>,
    #[serde(default)]
    pub allowed_confirmations: Vec<AllowedConfirmation>,
}

/// How the pending auth session may be confirmed
#[derive(Debug, Clone, Deserialize)]
pub struct AllowedConfirmation {
    pub confirmation_type: ConfirmationType,
    #[serde(default)]
    pub associated_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "i32")]
pub enum ConfirmationType {
    /// No confirmation needed, poll immediately
    None,
    /// Code sent to the account email
    EmailCode,
    /// Code from a registered authenticator
    DeviceCode,
    /// Approval prompt on a registered device
    DeviceConfirmation,
    /// Approval link sent to the account email
    EmailConfirmation,
    Unknown(i32),
}

impl From<i32> for ConfirmationType {
    fn from(value: i32) -> Self {
        match value {
            1 => Self::None,
            2 => Self::EmailCode,
            3 => Self::DeviceCode,
            4 => Self::DeviceConfirmation,
            5 => Self::EmailConfirmation,
            other => Self::Unknown(other),
        }
    }
}

/// UpdateAuthSessionWithSteamGuardCode request
#[derive(Debug, Clone, Serialize)]
pub struct UpdateAuthRequest {
    pub client_id: String,
    pub steamid: String,
    pub code: String,
    pub code_type: i32,
}

/// Guard code type for UpdateAuthRequest::code_type
pub const GUARD_CODE_TYPE_DEVICE: i32 = 3;

/// PollAuthSessionStatus request
#[derive(Debug, Clone, Serialize)]
pub struct PollStatusRequest {
    pub client_id: String,
    pub request_id: String,
}

/// PollAuthSessionStatus response; token fields stay absent while the
/// confirmation is pending
#[derive(Debug, Clone, Deserialize)]
pub struct PollStatusResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub had_remote_interaction: Option<bool>,
}

/// QueryTime response
#[derive(Debug, Clone, Deserialize)]
pub struct QueryTimeResponse {
    #[serde(default)]
    pub server_time: Option<String>,
}

/// Finalize-login response: transfer material for the per-domain exchanges
#[derive(Debug, Clone, Deserialize)]
pub struct FinalizeLoginResponse {
    #[serde(rename = "steamID", default)]
    pub steam_id: Option<String>,
    #[serde(default)]
    pub transfer_info: Vec<TransferInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferInfo {
    pub url: String,
    pub params: TransferParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferParams {
    pub nonce: String,
    pub auth: String,
}
