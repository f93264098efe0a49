//! Middleware for logging requests and responses.

use axum::{
    Json,
    body::{Body, Bytes},
    extract::Request,
    http::{StatusCode, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::Error;

/// Bodies longer than this many bytes are cut short in the `info` log.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// The `password` field of request bodies that parse as JSON is never logged,
/// whatever content type the client declared.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body_bytes) = match split_request(request).await {
        Ok(split) => split,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return Error::InvalidJson("could not read request body".to_owned()).into_response();
        }
    };

    log_request(&parts, &redact_password(&String::from_utf8_lossy(&body_bytes)));

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body_bytes) = match split_response(response).await {
        Ok(split) => split,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "An internal error occurred, check the server logs for more details.",
                })),
            )
                .into_response();
        }
    };
    log_response(&parts, &String::from_utf8_lossy(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

/// Replace the value of a top-level `password` field in a JSON object.
///
/// Text that is not a JSON object is returned unchanged.
fn redact_password(body_text: &str) -> String {
    let Ok(Value::Object(mut object)) = serde_json::from_str::<Value>(body_text) else {
        return body_text.to_owned();
    };

    match object.get_mut("password") {
        Some(password) => {
            *password = Value::String(REDACTED.to_owned());
            Value::Object(object).to_string()
        }
        None => body_text.to_owned(),
    }
}

/// The longest prefix of `text` that is at most `limit` bytes and ends on a
/// character boundary.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let end = text
        .char_indices()
        .map(|(index, _)| index)
        .take_while(|&index| index <= limit)
        .last()
        .unwrap_or(0);

    &text[..end]
}

async fn split_request(request: Request) -> Result<(request::Parts, Bytes), axum::Error> {
    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await?;

    Ok((parts, body_bytes))
}

async fn split_response(response: Response) -> Result<(response::Parts, Bytes), axum::Error> {
    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX).await?;

    Ok((parts, body_bytes))
}

fn log_request(parts: &request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            parts.method,
            parts.uri,
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            parts.status,
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}

#[cfg(test)]
mod redact_password_tests {
    use serde_json::{Value, json};

    use super::redact_password;

    #[test]
    fn password_is_replaced() {
        let redacted = redact_password(r#"{"email":"foo@bar.baz","password":"hunter2"}"#);

        let redacted: Value = serde_json::from_str(&redacted).unwrap();
        assert_eq!(
            redacted,
            json!({ "email": "foo@bar.baz", "password": "********" })
        );
    }

    #[test]
    fn body_without_password_is_unchanged() {
        let body = r#"{"name":"Wallet"}"#;

        assert_eq!(redact_password(body), body);
    }

    #[test]
    fn non_json_is_unchanged() {
        assert_eq!(redact_password("password=hunter2"), "password=hunter2");
        assert_eq!(redact_password(""), "");
    }
}
