// Application state shared across all modules

use anyhow::Context;
use sqlx::SqlitePool;
use std::sync::Arc;

use super::config::AppConfig;
use crate::applications::{JobApplicationRepo, SqliteJobApplicationRepo};
use crate::auth::{CredentialStore, OAuthClient, SqliteCredentialStore, TokenService};

/// Database pool, stores and auth services
///
/// Assembled once in `main` and shared read-only behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub credentials: Arc<dyn CredentialStore>,
    pub applications: Arc<dyn JobApplicationRepo>,
    pub tokens: TokenService,
    pub oauth: OAuthClient,
    pub frontend_url: String,
}

impl AppState {
    pub fn build(pool: SqlitePool, config: &AppConfig) -> anyhow::Result<Self> {
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl)
            .context("JWT_SECRET is not usable")?;
        let credentials = SqliteCredentialStore::new(pool.clone())
            .context("failed to initialize credential store")?;
        let oauth = OAuthClient::from_config(config).context("failed to build OAuth client")?;

        Ok(Self {
            credentials: Arc::new(credentials),
            applications: Arc::new(SqliteJobApplicationRepo::new(pool.clone())),
            db: pool,
            tokens,
            oauth,
            frontend_url: config.frontend_url.clone(),
        })
    }
}
