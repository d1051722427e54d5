use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way a call through the pipeline can fail.
#[derive(Debug, Error)]
pub enum Error {
    /// A bearer token could not be obtained; no business request was sent.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// No response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A response was received, but its body did not match the expected shape.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The remote API answered with a non-2xx status.
    #[error(transparent)]
    Remote(#[from] Box<ErrorResponse>),
    /// The request body could not be serialized.
    #[error("unable to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// The HTTP status of the response behind this error, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Remote(remote) => Some(remote.status),
            Self::Decode(decode) => Some(decode.status),
            Self::Auth(AuthError::Rejected(remote)) => Some(remote.status),
            Self::Auth(AuthError::Decode(decode)) => Some(decode.status),
            _ => None,
        }
    }

    /// The structured error reported by the remote API, if any.
    pub fn remote(&self) -> Option<&ErrorResponse> {
        match self {
            Self::Remote(remote) | Self::Auth(AuthError::Rejected(remote)) => Some(remote.as_ref()),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Transport(transport) | Self::Auth(AuthError::Transport(transport)) => {
                transport.kind == TransportErrorKind::Timeout
            }
            _ => false,
        }
    }
}

/// Token acquisition or renewal failed.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token endpoint rejected the client credentials: {0}")]
    Rejected(Box<ErrorResponse>),
    #[error("unable to reach token endpoint: {0}")]
    Transport(#[source] TransportError),
    #[error("unable to parse token endpoint response: {0}")]
    Decode(#[source] DecodeError),
    #[error("access token cannot be sent as an HTTP header")]
    InvalidToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timeout => "request timed out",
            Self::Connect => "connection failed",
            Self::Other => "request failed",
        })
    }
}

/// The request never produced a response (connection refused, TLS, timeout).
#[derive(Debug, Error)]
#[error("{method} {url}: {kind}: {source}")]
pub struct TransportError {
    pub method: Method,
    pub url: Url,
    pub kind: TransportErrorKind,
    #[source]
    pub source: reqwest::Error,
}

impl TransportError {
    pub fn new(method: Method, url: Url, source: reqwest::Error) -> Self {
        let kind = if source.is_timeout() {
            TransportErrorKind::Timeout
        } else if source.is_connect() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Other
        };
        Self {
            method,
            url,
            kind,
            source,
        }
    }
}

/// A response body could not be parsed into the expected shape.
#[derive(Debug, Error)]
#[error("{method} {url}: {status}: malformed response body: {source}")]
pub struct DecodeError {
    pub method: Method,
    pub url: Url,
    pub status: StatusCode,
    #[source]
    pub source: serde_json::Error,
}

/// The normalized shape of every non-2xx response.
///
/// See <https://developer.paypal.com/api/rest/responses/>.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Method of the request that failed.
    pub method: Method,
    /// URL of the request that failed.
    pub url: Url,
    pub status: StatusCode,
    /// Human-readable description.
    pub message: String,
    /// Machine-readable error name, e.g. `VALIDATION_ERROR`.
    pub name: String,
    /// Correlation identifier to quote when contacting support.
    pub debug_id: Option<String>,
    pub information_link: Option<String>,
    pub details: Vec<ErrorDetail>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {} {}",
            self.method,
            self.url,
            self.status.as_u16(),
            self.message
        )?;
        if !self.details.is_empty() {
            let details: Vec<String> = self
                .details
                .iter()
                .map(|detail| format!("{}: {}", detail.field, detail.issue))
                .collect();
            write!(f, ", [{}]", details.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorResponse {}

/// A single field-level problem within an [`ErrorResponse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub issue: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Where the field lives: `body`, `path` or `query`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
}

/// A HATEOAS link, as attached to errors and most resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    #[serde(default)]
    pub rel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}
