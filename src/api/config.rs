use super::error::{Error, Result};
use crate::oauth::{Credentials, DEFAULT_SAFETY_MARGIN};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// The two deployments of the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Sandbox,
    Live,
}

impl Environment {
    pub const SANDBOX_BASE_URL: &'static str = "https://api-m.sandbox.paypal.com";
    pub const LIVE_BASE_URL: &'static str = "https://api-m.paypal.com";

    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Sandbox => Self::SANDBOX_BASE_URL,
            Self::Live => Self::LIVE_BASE_URL,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sandbox => "sandbox",
            Self::Live => "live",
        })
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "live" => Ok(Self::Live),
            other => Err(Error::Config(format!(
                "unknown environment {other:?}, expected \"sandbox\" or \"live\""
            ))),
        }
    }
}

/// Construction-time options for an [`ApiClient`](super::ApiClient).
/// Nothing here is re-validated after the client is built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub environment: Environment,
    /// Replaces the environment's base URL, e.g. for an egress gateway.
    pub base_url: Option<Url>,
    /// Applied to every request, token fetches included.
    pub timeout: Option<Duration>,
    /// How long before expiry a token is treated as stale.
    pub safety_margin: Duration,
    /// Ask the API to echo the full resource on writes
    /// (`Prefer: return=representation`).
    pub return_representation: bool,
}

impl ClientConfig {
    pub fn new(credentials: Credentials, environment: Environment) -> Self {
        Self {
            credentials,
            environment,
            base_url: None,
            timeout: None,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            return_representation: false,
        }
    }

    /// Reads `PAYPAL_CLIENT_ID`, `PAYPAL_CLIENT_SECRET`, and optionally
    /// `PAYPAL_ENVIRONMENT` (default `sandbox`) and `PAYPAL_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| Error::Config(format!("{key} is not set")))
        };

        let credentials = Credentials::new(
            required("PAYPAL_CLIENT_ID")?,
            required("PAYPAL_CLIENT_SECRET")?,
        );
        let environment = match lookup("PAYPAL_ENVIRONMENT") {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };

        let mut config = Self::new(credentials, environment);
        if let Some(timeout) = lookup("PAYPAL_TIMEOUT_SECS") {
            let seconds: u64 = timeout.trim().parse().map_err(|_| {
                Error::Config(format!("PAYPAL_TIMEOUT_SECS must be whole seconds, got {timeout:?}"))
            })?;
            config.timeout = Some(Duration::from_secs(seconds));
        }
        Ok(config)
    }

    pub(crate) fn resolve_base_url(&self) -> Result<Url> {
        match &self.base_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(self.environment.base_url())
                .map_err(|error| Error::Config(format!("invalid base URL: {error}"))),
        }
    }
}
