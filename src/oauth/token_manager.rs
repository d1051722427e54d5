//! Owns the current access token and renews it before it expires.

use super::{oauth_client, Clock, Credentials, Token};
use crate::api::error::AuthError;
use crate::api::HttpClient;
use chrono::Duration;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

/// Tokens are renewed once they are this close to expiring.
pub const DEFAULT_SAFETY_MARGIN: StdDuration = StdDuration::from_secs(60);

pub struct TokenManager {
    http: Arc<HttpClient>,
    token_url: Url,
    credentials: Credentials,
    safety_margin: Duration,
    clock: Arc<dyn Clock>,
    current: Mutex<Option<Token>>,
}

impl TokenManager {
    pub fn new(
        http: Arc<HttpClient>,
        token_url: Url,
        credentials: Credentials,
        safety_margin: StdDuration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            http,
            token_url,
            credentials,
            safety_margin: Duration::from_std(safety_margin).unwrap_or(Duration::MAX),
            clock,
            current: Mutex::new(None),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns a token that is valid for at least the safety margin,
    /// fetching a new one if needed or if `force_refresh` is set.
    ///
    /// The lock is held across the fetch, so concurrent callers that all see
    /// a stale token wait for one fetch and then share its result.
    pub async fn ensure_valid(&self, force_refresh: bool) -> Result<Token, AuthError> {
        let mut current = self.current.lock().await;

        if !force_refresh {
            if let Some(token) = current.as_ref() {
                if token.is_fresh(self.clock.now(), self.safety_margin) {
                    debug!(expires_at = %token.expires_at, "reusing cached access token");
                    return Ok(token.clone());
                }
            }
        }

        debug!(client_id = self.credentials.client_id(), force_refresh, "requesting access token");
        let response =
            oauth_client::obtain_access_token(&self.http, &self.token_url, &self.credentials)
                .await?;
        let token = response.into_token(self.clock.now());
        info!(
            token_type = %token.token_type,
            expires_at = %token.expires_at,
            "obtained access token"
        );

        *current = Some(token.clone());
        Ok(token)
    }

    /// Installs a token obtained elsewhere, replacing the current one.
    pub async fn set_token(&self, token: Token) {
        *self.current.lock().await = Some(token);
    }

    #[cfg(test)]
    async fn current(&self) -> Option<Token> {
        self.current.lock().await.clone()
    }
}
