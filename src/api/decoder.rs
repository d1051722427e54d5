//! Turns a [`RawResponse`] into either the caller's type or an [`ErrorResponse`].

use super::error::{DecodeError, Error, ErrorDetail, ErrorResponse, Result};
use super::http_client::RawResponse;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

const DEBUG_ID_HEADER: &str = "paypal-debug-id";

/// Decodes a 2xx body into `T`. An empty body decodes as JSON `null`, so
/// `()` and `Option<_>` work for responses such as 204 No Content.
///
/// Any other status fails with [`Error::Remote`], whatever `T` is.
pub fn decode<T: DeserializeOwned>(response: &RawResponse) -> Result<T> {
    check_status(response)?;

    let body: &[u8] = if is_blank(&response.body) {
        b"null"
    } else {
        &response.body
    };
    serde_json::from_slice(body).map_err(|source| {
        Error::Decode(DecodeError {
            method: response.method.clone(),
            url: response.url.clone(),
            status: response.status,
            source,
        })
    })
}

/// Succeeds for any 2xx response without looking at the body.
pub fn check_status(response: &RawResponse) -> Result<()> {
    if response.status.is_success() {
        Ok(())
    } else {
        Err(Error::Remote(Box::new(remote_error(response))))
    }
}

/// Builds the structured error for a non-2xx response. A body that can't be
/// parsed still yields an error carrying the status and a generic message.
pub fn remote_error(response: &RawResponse) -> ErrorResponse {
    let body = match serde_json::from_slice::<ErrorBody>(&response.body) {
        Ok(body) => body,
        Err(error) => {
            if !is_blank(&response.body) {
                warn!(
                    method = %response.method,
                    url = %response.url,
                    status = %response.status,
                    %error,
                    "unable to parse error response body"
                );
            }
            ErrorBody::default()
        }
    };

    // Business-style fields win when a body carries both shapes.
    let name = body.name.or(body.error).unwrap_or_default();
    let message = body
        .message
        .or(body.error_description)
        .unwrap_or_else(|| generic_message(response));
    let debug_id = body.debug_id.or_else(|| {
        response
            .headers
            .get(DEBUG_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    });

    warn!(
        method = %response.method,
        url = %response.url,
        status = %response.status,
        name = %name,
        debug_id = debug_id.as_deref().unwrap_or("-"),
        "remote API returned an error"
    );

    ErrorResponse {
        method: response.method.clone(),
        url: response.url.clone(),
        status: response.status,
        message,
        name,
        debug_id,
        information_link: body.information_link,
        details: body.details,
    }
}

fn generic_message(response: &RawResponse) -> String {
    match response.status.canonical_reason() {
        Some(reason) => format!("request failed with status {} {reason}", response.status.as_u16()),
        None => format!("request failed with status {}", response.status.as_u16()),
    }
}

fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

/// Wire shape of an error body. Business endpoints send `name`/`message`; the
/// token endpoint sends OAuth-style `error`/`error_description`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    debug_id: Option<String>,
    #[serde(default)]
    information_link: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};
    use reqwest::{Method, StatusCode};
    use serde::Deserialize;
    use url::Url;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        id: String,
        status: String,
    }

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse {
            method: Method::POST,
            url: Url::parse("https://api-m.sandbox.paypal.com/v2/checkout/orders").unwrap(),
            status: StatusCode::from_u16(status).unwrap(),
            headers: HeaderMap::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn decodes_success_body() {
        let order: Order = decode(&response(201, r#"{"id":"5O190127TN364715T","status":"CREATED"}"#)).unwrap();
        assert_eq!(
            order,
            Order {
                id: "5O190127TN364715T".to_string(),
                status: "CREATED".to_string()
            }
        );
    }

    #[test]
    fn empty_success_body_decodes_as_unit() {
        decode::<()>(&response(204, "")).unwrap();
        assert_eq!(decode::<Option<Order>>(&response(204, "")).unwrap(), None);
    }

    #[test]
    fn malformed_success_body_is_a_decode_error() {
        let error = decode::<Order>(&response(200, r#"{"id":42}"#)).unwrap_err();
        match error {
            Error::Decode(decode) => {
                assert_eq!(decode.status, StatusCode::OK);
                assert_eq!(decode.method, Method::POST);
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn validation_error_is_fully_parsed() {
        let error = decode::<Order>(&response(
            422,
            r#"{"name":"VALIDATION_ERROR","message":"Invalid request","debug_id":"f1a2b3","details":[{"field":"amount","issue":"REQUIRED"}]}"#,
        ))
        .unwrap_err();

        let remote = error.remote().expect("remote error");
        assert_eq!(remote.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(remote.name, "VALIDATION_ERROR");
        assert_eq!(remote.message, "Invalid request");
        assert_eq!(remote.debug_id.as_deref(), Some("f1a2b3"));
        assert_eq!(remote.details.len(), 1);
        assert_eq!(remote.details[0].field, "amount");
        assert_eq!(remote.details[0].issue, "REQUIRED");
        assert_eq!(remote.method, Method::POST);
        assert_eq!(remote.url.path(), "/v2/checkout/orders");
    }

    #[test]
    fn non_2xx_fails_even_when_body_fits_the_success_shape() {
        let error = decode::<Order>(&response(409, r#"{"id":"X","status":"CREATED"}"#)).unwrap_err();
        assert_eq!(error.status(), Some(StatusCode::CONFLICT));
        assert!(matches!(error, Error::Remote(_)));
    }

    #[test]
    fn unparsable_error_body_degrades_to_minimal_error() {
        let error = decode::<Order>(&response(502, "<html>Bad Gateway</html>")).unwrap_err();
        let remote = error.remote().expect("remote error");
        assert_eq!(remote.status, StatusCode::BAD_GATEWAY);
        assert_eq!(remote.message, "request failed with status 502 Bad Gateway");
        assert!(remote.name.is_empty());
        assert!(remote.details.is_empty());
    }

    #[test]
    fn oauth_error_body_populates_name_and_message() {
        let remote = remote_error(&response(
            401,
            r#"{"error":"invalid_client","error_description":"Client Authentication failed"}"#,
        ));
        assert_eq!(remote.name, "invalid_client");
        assert_eq!(remote.message, "Client Authentication failed");
    }

    #[test]
    fn body_with_both_error_shapes_keeps_its_details() {
        let remote = remote_error(&response(
            400,
            r#"{"name":"INVALID_REQUEST","message":"Request is not well-formed","error":"invalid_request","error_description":"bad","debug_id":"d3b7","details":[{"field":"intent","issue":"MISSING_REQUIRED_PARAMETER"}]}"#,
        ));
        assert_eq!(remote.name, "INVALID_REQUEST");
        assert_eq!(remote.message, "Request is not well-formed");
        assert_eq!(remote.debug_id.as_deref(), Some("d3b7"));
        assert_eq!(remote.details.len(), 1);
        assert_eq!(remote.details[0].field, "intent");
    }

    #[test]
    fn debug_id_falls_back_to_response_header() {
        let mut raw = response(500, r#"{"name":"INTERNAL_SERVICE_ERROR","message":"boom"}"#);
        raw.headers
            .insert(DEBUG_ID_HEADER, HeaderValue::from_static("9c2f1e"));
        assert_eq!(remote_error(&raw).debug_id.as_deref(), Some("9c2f1e"));
    }

    #[test]
    fn check_status_ignores_success_bodies() {
        check_status(&response(200, "not json at all")).unwrap();
        assert!(check_status(&response(404, "")).is_err());
    }
}
