use super::config::{ClientConfig, Environment};
use super::decoder;
use super::error::{AuthError, Error, Result};
use super::http_client::{HttpClient, RawResponse};
use super::log_sink::{LogSink, NoopSink};
use crate::oauth::{oauth_client, Clock, Credentials, SystemClock, Token, TokenManager};
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use url::Url;

const REQUEST_ID_HEADER: &str = "paypal-request-id";
const PARTNER_ATTRIBUTION_HEADER: &str = "paypal-partner-attribution-id";
const PREFER_HEADER: &str = "prefer";

/// How a request proves who is calling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Auth {
    /// `Authorization: Bearer <access token>`, renewing the token as needed.
    #[default]
    Bearer,
    /// `Authorization: Basic <client id:secret>`.
    Basic,
    None,
}

/// One call against the API: method, path, optional JSON body, and headers.
///
/// Builder errors (an unserializable body, an invalid header) are held until
/// the request is executed, so calls can be chained.
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<Vec<u8>>,
    auth: Auth,
    headers: HeaderMap,
    timeout: Option<Duration>,
    error: Option<Error>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            auth: Auth::default(),
            headers: HeaderMap::new(),
            timeout: None,
            error: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Self {
        match serde_json::to_vec(body) {
            Ok(bytes) => self.body = Some(bytes),
            Err(error) => self.fail(Error::Encode(error)),
        }
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    /// Adds a header, replacing any default with the same name. An
    /// `Authorization` header is ignored unless auth is [`Auth::None`].
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: fmt::Display,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: fmt::Display,
    {
        let name = match HeaderName::try_from(name) {
            Ok(name) => name,
            Err(error) => {
                self.fail(Error::Config(format!("invalid header name: {error}")));
                return self;
            }
        };
        match HeaderValue::try_from(value) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(error) => self.fail(Error::Config(format!("invalid value for {name}: {error}"))),
        }
        self
    }

    /// Makes a write safe to retry: the API replays the first result for a
    /// repeated key.
    pub fn idempotency_key(self, key: &str) -> Self {
        self.header(REQUEST_ID_HEADER, key)
    }

    pub fn new_idempotency_key(self) -> Self {
        let key = uuid::Uuid::new_v4().to_string();
        self.header(REQUEST_ID_HEADER, key)
    }

    pub fn partner_attribution_id(self, id: &str) -> Self {
        self.header(PARTNER_ATTRIBUTION_HEADER, id)
    }

    /// Deadline for this call only; overrides the client-wide timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn fail(&mut self, error: Error) {
        self.error.get_or_insert(error);
    }
}

/// A client for the REST API, safe to share between tasks.
///
/// Holds one pooled HTTP transport and one token cache; clone an `Arc` of it
/// rather than building a client per call.
pub struct ApiClient {
    base_url: Url,
    http: Arc<HttpClient>,
    tokens: TokenManager,
    return_representation: bool,
}

impl ApiClient {
    pub fn new(credentials: Credentials, environment: Environment) -> Result<Self> {
        Self::builder(credentials, environment).build()
    }

    pub fn builder(credentials: Credentials, environment: Environment) -> ClientBuilder {
        ClientBuilder::new(ClientConfig::new(credentials, environment))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// A valid access token, fetched only if there is no fresh one cached.
    pub async fn access_token(&self) -> Result<Token> {
        Ok(self.tokens.ensure_valid(false).await?)
    }

    /// Fetches a new access token even if the cached one is still fresh.
    pub async fn refresh_access_token(&self) -> Result<Token> {
        Ok(self.tokens.ensure_valid(true).await?)
    }

    pub async fn set_access_token(&self, token: Token) {
        self.tokens.set_token(token).await;
    }

    /// Builds and sends a request, returning the response whatever its
    /// status. See [`send`](Self::send) for the decoded variant.
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, request: ApiRequest) -> Result<RawResponse> {
        let ApiRequest {
            method,
            path,
            body,
            auth,
            headers: extra_headers,
            timeout,
            error,
        } = request;
        // Anything the builder rejected fails here, before a token is fetched.
        if let Some(error) = error {
            return Err(error);
        }

        let url = self.endpoint(&path)?;

        // Defaults first. The caller's headers are layered on top and replace
        // any default with the same name.
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en_US"));
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        if self.return_representation {
            headers.insert(PREFER_HEADER, HeaderValue::from_static("return=representation"));
        }
        headers.extend(extra_headers);

        // A failed token fetch ends the call here, with nothing sent.
        let authorization = match auth {
            Auth::Bearer => {
                let token = self.tokens.ensure_valid(false).await?;
                Some(bearer_header(&token)?)
            }
            Auth::Basic | Auth::None => None,
        };
        // Whenever we authenticate, ours is the only Authorization header.
        // reqwest appends rather than replaces, so a caller's copy has to go.
        if auth != Auth::None {
            headers.remove(AUTHORIZATION);
        }

        let mut builder = self.http.request(method, url).headers(headers);
        if let Some(authorization) = authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        if auth == Auth::Basic {
            let credentials = self.tokens.credentials();
            builder = builder.basic_auth(credentials.client_id(), Some(credentials.client_secret()));
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }
        // Overrides the client-wide timeout for this request only.
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let request = builder
            .build()
            .map_err(|error| Error::Config(format!("unable to build request: {error}")))?;
        Ok(self.http.send(request).await?)
    }

    /// Executes a request and decodes a 2xx body into `T`.
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.execute(request).await?;
        decoder::decode(&response)
    }

    /// Executes a request whose success carries no meaningful body.
    pub async fn send_empty(&self, request: ApiRequest) -> Result<()> {
        let response = self.execute(request).await?;
        decoder::check_status(&response)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).json(body)).await
    }

    /// Resolves a request path against the base URL. Absolute URLs, such as
    /// HATEOAS links returned by the API, are used as they are.
    fn endpoint(&self, path: &str) -> Result<Url> {
        endpoint(&self.base_url, path)
    }
}

fn endpoint(base_url: &Url, path: &str) -> Result<Url> {
    let joined = if path.starts_with("http://") || path.starts_with("https://") {
        Url::parse(path)
    } else {
        let base = base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
    };
    joined.map_err(|error| Error::Config(format!("invalid request path {path:?}: {error}")))
}

fn bearer_header(token: &Token) -> Result<HeaderValue, AuthError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.access_token))
        .map_err(|_| AuthError::InvalidToken)?;
    value.set_sensitive(true);
    Ok(value)
}

/// Named construction options for [`ApiClient`].
pub struct ClientBuilder {
    config: ClientConfig,
    log_sink: Arc<dyn LogSink>,
    clock: Arc<dyn Clock>,
}

impl ClientBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            log_sink: Arc::new(NoopSink),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn base_url(mut self, base_url: Url) -> Self {
        self.config.base_url = Some(base_url);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    pub fn safety_margin(mut self, margin: Duration) -> Self {
        self.config.safety_margin = margin;
        self
    }

    pub fn return_representation(mut self, enabled: bool) -> Self {
        self.config.return_representation = enabled;
        self
    }

    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = sink;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let base_url = self.config.resolve_base_url()?;
        let token_url = endpoint(&base_url, oauth_client::ACCESS_TOKEN_PATH)?;
        let http = Arc::new(HttpClient::new(self.config.timeout, self.log_sink)?);
        let tokens = TokenManager::new(
            Arc::clone(&http),
            token_url,
            self.config.credentials,
            self.config.safety_margin,
            self.clock,
        );

        Ok(ApiClient {
            base_url,
            http,
            tokens,
            return_representation: self.config.return_representation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let base = Url::parse("https://gateway.example.com/paypal/").unwrap();
        assert_eq!(
            endpoint(&base, "/v2/checkout/orders").unwrap().as_str(),
            "https://gateway.example.com/paypal/v2/checkout/orders"
        );

        let root = Url::parse(Environment::SANDBOX_BASE_URL).unwrap();
        assert_eq!(
            endpoint(&root, "v1/oauth2/token").unwrap().as_str(),
            "https://api-m.sandbox.paypal.com/v1/oauth2/token"
        );
    }

    #[test]
    fn endpoint_accepts_absolute_links() {
        let base = Url::parse(Environment::LIVE_BASE_URL).unwrap();
        let link = "https://api-m.paypal.com/v1/billing/plans?page=2";
        assert_eq!(endpoint(&base, link).unwrap().as_str(), link);
    }

    #[test]
    fn builder_errors_surface_on_first_failure() {
        let request = ApiRequest::post("/v1/x")
            .header("bad header", "value")
            .header("x-fine", "bad\nvalue");
        assert!(matches!(request.error, Some(Error::Config(message)) if message.contains("header name")));
    }

    #[test]
    fn idempotency_keys_are_unique() {
        let first = ApiRequest::post("/v1/x").new_idempotency_key();
        let second = ApiRequest::post("/v1/x").new_idempotency_key();
        assert_ne!(first.headers[REQUEST_ID_HEADER], second.headers[REQUEST_ID_HEADER]);
        assert!(first.error.is_none());
    }

    #[test]
    fn builds_against_selected_environment() {
        let client = ApiClient::new(Credentials::new("id", "secret"), Environment::Live).unwrap();
        assert_eq!(client.base_url().as_str(), "https://api-m.paypal.com/");
    }
}
