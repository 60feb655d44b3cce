use chrono::Utc;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::errors::{Result, SwAuthError, classify_response};
use crate::models::{ApiResponse, QueryTimeResponse};

/// Server clock offset used for authenticator code generation.
///
/// Fetches the server time once per instance and caches the delta. An
/// unreachable time source is never fatal: the local clock is used with a
/// zero offset and a skewed code, if any, is rejected by the server as its
/// own error.
#[derive(Debug)]
pub struct TimeSync {
    http: Client,
    query_time_url: Url,
    offset: RwLock<Option<i64>>,
}

impl TimeSync {
    pub fn new(http: Client, query_time_url: Url) -> Self {
        Self {
            http,
            query_time_url,
            offset: RwLock::new(None),
        }
    }

    /// Cached `server - local` delta in seconds.
    pub async fn offset(&self) -> i64 {
        if let Some(offset) = *self.offset.read().await {
            return offset;
        }

        let mut cached = self.offset.write().await;
        // Another task may have fetched while we waited on the lock.
        if let Some(offset) = *cached {
            return offset;
        }

        let offset = match self.fetch_offset().await {
            Ok(offset) => {
                debug!(offset, "synchronized with server clock");
                offset
            }
            Err(error) => {
                warn!(%error, "server time sync failed, falling back to local clock");
                0
            }
        };
        *cached = Some(offset);
        offset
    }

    /// Server-adjusted unix seconds.
    pub async fn now(&self) -> u64 {
        let adjusted = Utc::now().timestamp() + self.offset().await;
        adjusted.max(0) as u64
    }

    async fn fetch_offset(&self) -> Result<i64> {
        let resp = self
            .http
            .post(self.query_time_url.clone())
            .send()
            .await?;
        let resp = classify_response(resp).await?;
        let parsed: ApiResponse<QueryTimeResponse> = resp.json().await?;
        let server_time: i64 = parsed
            .response
            .server_time
            .as_deref()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                SwAuthError::InvalidResponse("query time returned no server_time".to_string())
            })?;
        Ok(server_time - Utc::now().timestamp())
    }
}
