// src/app.rs
//! Router composition shared by `main` and the router-level tests

use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    extract::{Extension, MatchedPath, Request},
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    BoxError, Json, Router,
};
use serde_json::{json, Value};
use std::any::Any;
use std::sync::Arc;
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info_span, Span};

use crate::applications::applications_routes;
use crate::auth::auth_routes;
use crate::common::config::AppConfig;
use crate::common::{ApiError, AppState};
use crate::logging_middleware;

/// GET /health - 200 once the database answers
async fn health(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(ApiError::DatabaseError)?;

    Ok(Json(json!({ "status": "ok" })))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Resource not found".to_string())
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(panic = %detail, "Handler panicked");

    ApiError::InternalServer("handler panicked".to_string()).into_response()
}

/// Errors surfaced by the timeout layer
async fn layer_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::RequestTimeout("Request took too long".to_string())
    } else {
        ApiError::InternalServer(err.to_string())
    }
}

/// Route template when matched, bare path otherwise. Never the query string,
/// which can carry OAuth codes.
fn request_route(request: &Request<Body>) -> &str {
    request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str)
}

fn make_span(request: &Request<Body>) -> Span {
    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = request_route(request),
    )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}

pub fn build_router(state: Arc<AppState>, config: &AppConfig) -> Router {
    let providers = state.oauth.provider_names();

    Router::new()
        // ====================================================================
        // AUTHENTICATION ROUTES (password and OAuth)
        // ====================================================================
        .merge(auth_routes(&providers))
        // ====================================================================
        // JOB APPLICATION ROUTES (owner scoped)
        // ====================================================================
        .merge(applications_routes())
        .route("/health", get(health))
        .fallback(not_found)
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        // Add request/response body logging in debug mode
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(Extension(state))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(layer_error))
                .timeout(config.request_timeout),
        )
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_elapsed_timeout_renders_envelope() {
        let response = layer_error(Box::new(Elapsed::new())).await.into_response();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "REQUEST_TIMEOUT");
    }

    #[test]
    fn test_request_route_drops_query_string() {
        let request = axum::http::Request::builder()
            .uri("/auth/github-callback?code=gho_secret_code")
            .body(Body::empty())
            .unwrap();

        assert_eq!(request_route(&request), "/auth/github-callback");
    }
}
