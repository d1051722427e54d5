//! Authenticated request pipeline for the PayPal REST API.
//!
//! [`ApiClient`] fetches and caches an OAuth2 client-credentials token,
//! renews it shortly before it expires, and sends typed requests, turning
//! non-2xx responses into [`ErrorResponse`]s.
//!
//! ```no_run
//! use paypalctl::{ApiClient, ApiRequest, Credentials, Environment};
//! use serde_json::{json, Value};
//!
//! # async fn example() -> paypalctl::Result<()> {
//! let client = ApiClient::new(Credentials::new("client-id", "secret"), Environment::Sandbox)?;
//! let order: Value = client
//!     .send(
//!         ApiRequest::post("/v2/checkout/orders")
//!             .json(&json!({ "intent": "CAPTURE" }))
//!             .new_idempotency_key(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod codec;
pub mod oauth;

pub use api::{
    ApiClient, ApiRequest, Auth, AuthError, ClientBuilder, ClientConfig, DecodeError,
    Environment, Error, ErrorDetail, ErrorResponse, RawResponse, Result, TransportError,
};
pub use codec::Timestamp;
pub use oauth::{Credentials, Token};
