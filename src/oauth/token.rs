use crate::codec::expires_in;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of a successful `/v1/oauth2/token` response.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Seconds until expiry, relative to when the response was received.
    #[serde(with = "expires_in")]
    pub expires_in: i64,
}

impl TokenResponse {
    /// Pins the relative expiry to an absolute instant.
    pub fn into_token(self, received_at: DateTime<Utc>) -> Token {
        let expires_at = Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| received_at.checked_add_signed(lifetime))
            .unwrap_or(if self.expires_in < 0 {
                received_at
            } else {
                DateTime::<Utc>::MAX_UTC
            });
        Token {
            expires_at,
            access_token: self.access_token,
            token_type: self.token_type,
            refresh_token: self.refresh_token,
            scope: self.scope,
            app_id: self.app_id,
        }
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("app_id", &self.app_id)
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// A bearer token together with the instant it stops being valid.
///
/// Replaced wholesale on renewal, never edited in place.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub app_id: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Whether the token is still usable at `now` with `margin` to spare.
    pub fn is_fresh(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at
            .checked_sub_signed(margin)
            .is_some_and(|deadline| deadline > now)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[redacted]")
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("app_id", &self.app_id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
