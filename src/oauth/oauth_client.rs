use super::{Credentials, TokenResponse};
use crate::api::decoder;
use crate::api::error::{AuthError, DecodeError, TransportError};
use crate::api::HttpClient;
use reqwest::Method;
use url::Url;

/// Path of the token endpoint, relative to the API base URL.
pub const ACCESS_TOKEN_PATH: &str = "/v1/oauth2/token";

/// Exchanges the client id/secret for an access token via the
/// `client_credentials` grant.
pub async fn obtain_access_token(
    http: &HttpClient,
    token_url: &Url,
    credentials: &Credentials,
) -> Result<TokenResponse, AuthError> {
    let request = http
        .request(Method::POST, token_url.clone())
        .basic_auth(credentials.client_id(), Some(credentials.client_secret()))
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&[("grant_type", "client_credentials")])
        .build()
        .map_err(|error| {
            AuthError::Transport(TransportError::new(Method::POST, token_url.clone(), error))
        })?;

    let response = http.send(request).await.map_err(AuthError::Transport)?;

    // Any non-2xx status means the credentials were refused (or the endpoint
    // is unwell); either way, surface whatever detail came back.
    if !response.status.is_success() {
        return Err(AuthError::Rejected(Box::new(decoder::remote_error(&response))));
    }

    serde_json::from_slice(&response.body).map_err(|source| {
        AuthError::Decode(DecodeError {
            method: response.method.clone(),
            url: response.url.clone(),
            status: response.status,
            source,
        })
    })
}
