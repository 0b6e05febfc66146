//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::common::{ApiError, AppState};

/// Authenticated caller
///
/// Built from the bearer token alone: signature and expiry are checked, then
/// the subject claim becomes `id`. Every owner-scoped store call takes this id.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub id: String,
    pub username: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(app_state): Extension<Arc<AppState>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let token = match parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
        {
            Some(t) => t,
            None => {
                warn!("Authentication failed: missing Authorization header");
                return Err(ApiError::Unauthorized("missing auth".into()));
            }
        };

        // Handle "Bearer <token>" format or raw token
        let bare_token = token.strip_prefix("Bearer ").unwrap_or(token).trim();

        let claims = app_state.tokens.verify(bare_token).map_err(|e| {
            warn!(error = %e, "JWT token validation failed");
            ApiError::Unauthorized("invalid token".into())
        })?;

        debug!(user_id = %claims.sub, "Bearer token accepted");

        Ok(AuthedUser {
            id: claims.sub,
            username: claims.username,
        })
    }
}
