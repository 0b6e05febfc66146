// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use tracing::{debug, Level};

const REDACTED: &str = "[REDACTED]";

/// JSON keys whose values never reach the log
const SENSITIVE_KEYS: [&str; 6] = [
    "password",
    "token",
    "access_token",
    "client_secret",
    "code",
    "authorization",
];

/// Replaces sensitive values anywhere in a JSON document
pub fn redact_sensitive(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map.iter_mut() {
                if SENSITIVE_KEYS.contains(&key.to_ascii_lowercase().as_str()) {
                    *inner = Value::String(REDACTED.to_string());
                } else {
                    redact_sensitive(inner);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_sensitive),
        _ => {}
    }
}

fn printable(bytes: &[u8]) -> Option<String> {
    let body_str = std::str::from_utf8(bytes).ok()?;
    match serde_json::from_str::<Value>(body_str) {
        Ok(mut json) => {
            redact_sensitive(&mut json);
            Some(serde_json::to_string_pretty(&json).unwrap_or_else(|_| REDACTED.to_string()))
        }
        // Non-JSON bodies are not inspected, so they are not logged either
        Err(_) => Some(format!("<{} bytes, not JSON>", bytes.len())),
    }
}

/// Middleware to log request and response bodies in debug mode
///
/// Only the path is logged; query strings can carry OAuth codes.
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    if !tracing::enabled!(Level::DEBUG) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !bytes.is_empty() {
        if let Some(request_body) = printable(&bytes) {
            debug!(
                method = %parts.method,
                path = %parts.uri.path(),
                request_body = %request_body,
                "📥 Request"
            );
        }
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !bytes.is_empty() {
        if let Some(response_body) = printable(&bytes) {
            debug!(
                status = %parts.status,
                response_body = %response_body,
                "📤 Response"
            );
        }
    }

    Ok(Response::from_parts(parts, Body::from(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redacts_nested_secrets() {
        let mut body = json!({
            "username": "alice",
            "password": "Secret123!",
            "nested": [{"token": "eyJ..."}, {"Client_Secret": "shh"}],
        });

        redact_sensitive(&mut body);

        assert_eq!(body["username"], "alice");
        assert_eq!(body["password"], REDACTED);
        assert_eq!(body["nested"][0]["token"], REDACTED);
        assert_eq!(body["nested"][1]["Client_Secret"], REDACTED);
    }

    #[test]
    fn test_non_json_bodies_are_summarized() {
        assert_eq!(
            printable(b"password=hunter2").as_deref(),
            Some("<16 bytes, not JSON>")
        );
    }
}
