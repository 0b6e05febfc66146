//! Shared fixtures for module tests: in-memory database, state and router

use argon2::{Algorithm, Argon2, Params, Version};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use reqwest::Client;
use serde_json::Value;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

use super::config::AppConfig;
use super::migrations::run_migrations;
use super::AppState;
use crate::applications::SqliteJobApplicationRepo;
use crate::auth::models::User;
use crate::auth::oauth::OAuthProvider;
use crate::auth::{OAuthClient, SqliteCredentialStore, TokenService};

pub const TEST_SECRET: &str = "test-secret-with-enough-entropy-for-hs512";
pub const FRONTEND: &str = "http://frontend.test";

/// One connection, otherwise every new connection sees its own empty database
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    run_migrations(&pool, false).await.expect("migrations");
    pool
}

pub fn test_config() -> AppConfig {
    AppConfig::from_map(&HashMap::from([
        ("JWT_SECRET", TEST_SECRET),
        ("FRONTEND_URL", FRONTEND),
    ]))
    .expect("test config")
}

/// Argon2id with minimal cost so tests stay fast
pub fn light_hasher() -> Argon2<'static> {
    let params = Params::new(8, 1, 1, None).expect("argon2 params");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

pub fn test_tokens() -> TokenService {
    TokenService::new(TEST_SECRET, test_config().token_ttl).expect("token service")
}

pub fn test_user(id: &str, username: &str) -> User {
    User {
        id: id.to_string(),
        username: username.to_string(),
        normalized_username: username.to_uppercase(),
        password_hash: None,
        email: None,
        provider: None,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

pub fn token_for(id: &str, username: &str) -> String {
    test_tokens()
        .issue(&test_user(id, username))
        .expect("token")
}

pub fn test_state(pool: SqlitePool, providers: Vec<OAuthProvider>) -> Arc<AppState> {
    let credentials =
        SqliteCredentialStore::with_hasher(pool.clone(), light_hasher()).expect("credential store");

    let http = Client::builder()
        .no_proxy()
        .build()
        .expect("http client");

    Arc::new(AppState {
        credentials: Arc::new(credentials),
        applications: Arc::new(SqliteJobApplicationRepo::new(pool.clone())),
        db: pool,
        tokens: test_tokens(),
        oauth: OAuthClient::new(http, providers),
        frontend_url: FRONTEND.to_string(),
    })
}

pub fn test_router(state: Arc<AppState>) -> Router {
    crate::app::build_router(state, &test_config())
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("router is infallible")
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body")
        .to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request")
}

/// Inserts a bare user row so application rows can reference it
pub async fn insert_user(pool: &SqlitePool, id: &str, username: &str) {
    sqlx::query("INSERT INTO users (id, username, normalized_username) VALUES (?, ?, ?)")
        .bind(id)
        .bind(username)
        .bind(username.to_uppercase())
        .execute(pool)
        .await
        .expect("insert user");
}
