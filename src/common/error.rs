// Error handling types for the API

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::fmt;
use tracing::{error, warn};

use super::validation::{ValidationError, ValidationResult};

/// API error types
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    NotFound(String),
    RequestTimeout(String),
    InternalServer(String),
    DatabaseError(sqlx::Error),
    ValidationError(Vec<ValidationError>),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::RequestTimeout(msg) => write!(f, "Request Timeout: {}", msg),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::DatabaseError(e) => write!(f, "Database Error: {}", e),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation Error: {} field error(s)", errors.len())
            }
        }
    }
}

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let mut errors = Vec::new();
        let (status, error_message, code) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED"),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            ApiError::RequestTimeout(msg) => (StatusCode::REQUEST_TIMEOUT, msg, "REQUEST_TIMEOUT"),
            ApiError::InternalServer(msg) => {
                // Detail stays in the server log
                error!(detail = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    "INTERNAL_SERVER_ERROR",
                )
            }
            ApiError::DatabaseError(e) => {
                error!(error = %e, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed".to_string(),
                    "DATABASE_ERROR",
                )
            }
            ApiError::ValidationError(field_errors) => {
                errors = field_errors;
                (
                    StatusCode::BAD_REQUEST,
                    "One or more validation errors occurred".to_string(),
                    "VALIDATION_ERROR",
                )
            }
        };

        let error_response = ErrorResponse {
            error: error_message,
            code: code.to_string(),
            errors,
        };

        (status, Json(error_response)).into_response()
    }
}

/// Helper function to convert ValidationResult to ApiError
impl From<ValidationResult> for ApiError {
    fn from(result: ValidationResult) -> Self {
        if result.is_valid {
            ApiError::InternalServer(
                "Validation result was valid but converted to error".to_string(),
            )
        } else {
            ApiError::ValidationError(result.errors)
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection.body_text(), "Rejected malformed JSON body");
        ApiError::BadRequest("Request body is not valid JSON for this endpoint".to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        // Missing route parameters are a routing bug, not bad input
        if rejection.status().is_server_error() {
            return ApiError::InternalServer(rejection.body_text());
        }
        warn!(error = %rejection.body_text(), "Rejected malformed path parameter");
        ApiError::BadRequest("Invalid path parameter".to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!(error = %rejection.body_text(), "Rejected malformed query string");
        ApiError::BadRequest("Invalid query string".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_lists_every_field() {
        let (status, body) = body_json(ApiError::ValidationError(vec![
            ValidationError::new("username", "taken"),
            ValidationError::new("password", "too short"),
        ]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
        assert_eq!(body["errors"][1]["field"], "password");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let (status, body) =
            body_json(ApiError::InternalServer("disk I/O error at /var/db".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("/var/db"));
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_database_error_is_generic() {
        let (status, body) = body_json(ApiError::DatabaseError(sqlx::Error::RowNotFound)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "DATABASE_ERROR");
    }

    #[tokio::test]
    async fn test_timeout_uses_envelope() {
        let (status, body) =
            body_json(ApiError::RequestTimeout("Request took too long".to_string())).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["code"], "REQUEST_TIMEOUT");
    }
}
