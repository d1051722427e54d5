use super::error::{Error, Result, TransportError};
use super::log_sink::{LogSink, RequestRecord};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// A fully received response. The body has been read to completion, so the
/// decoder never touches the network.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// Method of the request this answers.
    pub method: Method,
    /// URL of the request this answers.
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// The single pooled transport owned by a client instance.
pub struct HttpClient {
    inner: reqwest::Client,
    default_headers: HeaderMap,
    log_sink: Arc<dyn LogSink>,
}

impl HttpClient {
    pub fn new(timeout: Option<Duration>, log_sink: Arc<dyn LogSink>) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("paypalctl/", env!("CARGO_PKG_VERSION"))),
        );

        let mut builder = reqwest::Client::builder().default_headers(default_headers.clone());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder
            .build()
            .map_err(|error| Error::Config(format!("unable to build HTTP client: {error}")))?;

        Ok(Self {
            inner,
            default_headers,
            log_sink,
        })
    }

    pub fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        self.inner.request(method, url)
    }

    /// Sends a request and reads the whole response. No retries: the first
    /// transport failure is returned as is.
    pub async fn send(&self, request: reqwest::Request) -> Result<RawResponse, TransportError> {
        let method = request.method().clone();
        let url = request.url().clone();

        if self.log_sink.enabled() {
            self.log_sink.log_request(&RequestRecord::from_request(&request, &self.default_headers));
        }

        debug!(%method, %url, "sending request");
        let response = self
            .inner
            .execute(request)
            .await
            .map_err(|error| TransportError::new(method.clone(), url.clone(), error))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|error| TransportError::new(method.clone(), url.clone(), error))?
            .to_vec();
        debug!(%method, %url, %status, bytes = body.len(), "received response");

        let raw = RawResponse {
            method,
            url,
            status,
            headers,
            body,
        };
        if self.log_sink.enabled() {
            self.log_sink.log_response(&raw);
        }
        Ok(raw)
    }
}
