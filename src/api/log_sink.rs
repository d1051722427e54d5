//! Optional side channel receiving a dump of every exchange.
//!
//! A sink only observes. Whatever it does (including failing to write) has
//! no effect on the result handed back to the caller.

use super::http_client::RawResponse;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use std::io::Write;
use std::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

/// The outbound half of an exchange, with credentials already redacted.
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl RequestRecord {
    /// Captures a request as it goes out: its own headers plus any client
    /// defaults it doesn't override. Connection-level headers (`host`,
    /// `content-length`) are added by the transport later and never appear.
    pub(crate) fn from_request(request: &reqwest::Request, defaults: &HeaderMap) -> Self {
        let mut headers = request.headers().clone();
        for (name, value) in defaults {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), value.clone());
            }
        }
        Self {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: redact(&headers),
            body: request
                .body()
                .and_then(|body| body.as_bytes())
                .map(<[u8]>::to_vec),
        }
    }
}

fn redact(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();
    if headers.contains_key(AUTHORIZATION) {
        headers.insert(AUTHORIZATION, HeaderValue::from_static("[redacted]"));
    }
    headers
}

pub trait LogSink: Send + Sync {
    /// Whether records should be built at all. Lets the no-op sink skip the copies.
    fn enabled(&self) -> bool {
        true
    }

    fn log_request(&self, request: &RequestRecord);

    fn log_response(&self, response: &RawResponse);
}

/// Discards everything. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn enabled(&self) -> bool {
        false
    }

    fn log_request(&self, _request: &RequestRecord) {}

    fn log_response(&self, _response: &RawResponse) {}
}

/// Emits each dump as a `debug!` event under the `paypalctl::wire` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log_request(&self, request: &RequestRecord) {
        debug!(target: "paypalctl::wire", "{}", dump_request(request));
    }

    fn log_response(&self, response: &RawResponse) {
        debug!(target: "paypalctl::wire", "{}", dump_response(response));
    }
}

/// Writes plain-text dumps to any writer: a file, stderr, a buffer in tests.
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self, dump: &str) {
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(error) = writeln!(writer, "{dump}").and_then(|_| writer.flush()) {
            warn!(%error, "unable to write to log sink");
        }
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn log_request(&self, request: &RequestRecord) {
        self.write(&dump_request(request));
    }

    fn log_response(&self, response: &RawResponse) {
        self.write(&dump_response(response));
    }
}

fn dump_headers(out: &mut String, headers: &HeaderMap) {
    for (name, value) in headers {
        out.push_str(name.as_str());
        out.push_str(": ");
        out.push_str(&String::from_utf8_lossy(value.as_bytes()));
        out.push('\n');
    }
}

pub fn dump_request(request: &RequestRecord) -> String {
    let mut out = format!("{} {}\n", request.method, request.url);
    dump_headers(&mut out, &request.headers);
    if let Some(body) = &request.body {
        out.push('\n');
        out.push_str(&String::from_utf8_lossy(body));
        out.push('\n');
    }
    out
}

pub fn dump_response(response: &RawResponse) -> String {
    let mut out = format!("{} <- {} {}\n", response.status, response.method, response.url);
    dump_headers(&mut out, &redact(&response.headers));
    if !response.body.is_empty() {
        out.push('\n');
        out.push_str(&String::from_utf8_lossy(&response.body));
        out.push('\n');
    }
    out
}
