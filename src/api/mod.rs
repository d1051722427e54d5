mod client;
mod config;
pub mod decoder;
pub mod error;
mod http_client;
pub mod log_sink;

pub use client::{ApiClient, ApiRequest, Auth, ClientBuilder};
pub use config::{ClientConfig, Environment};
pub use error::{
    AuthError, DecodeError, Error, ErrorDetail, ErrorResponse, Link, Result, TransportError,
    TransportErrorKind,
};
pub use http_client::{HttpClient, RawResponse};
pub use log_sink::{LogSink, NoopSink, RequestRecord, TracingSink, WriterSink};
