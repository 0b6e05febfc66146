//! Authentication handlers

use axum::{
    extract::{Extension, Json},
    response::Response,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::credentials::CredentialError;
use super::extractors::AuthedUser;
use super::models::{CredentialsRequest, LoginResponse, OAuthCallbackQuery, UserSummary};
use super::oauth::{frontend_redirect, OAuthProvider};
use super::validators::CredentialsValidator;
use crate::common::{
    found, safe_token_log, ApiError, AppState, JsonBody, QueryParams, Validator,
};

/// Same text for unknown users and wrong passwords
const LOGIN_FAILED: &str = "Invalid username or password";

/// Provider name bound to an OAuth route when the router is built
#[derive(Clone, Copy, Debug)]
pub struct ProviderRoute(pub &'static str);

fn credential_failure(e: CredentialError) -> ApiError {
    match e {
        CredentialError::Database(db) => ApiError::DatabaseError(db),
        other => ApiError::InternalServer(other.to_string()),
    }
}

fn configured_provider<'a>(
    state: &'a AppState,
    route: ProviderRoute,
) -> Result<&'a OAuthProvider, ApiError> {
    state
        .oauth
        .provider(route.0)
        .ok_or_else(|| ApiError::NotFound(format!("OAuth provider {} is not configured", route.0)))
}

/// POST /auth/register
/// Creates a password account
///
/// # Request Body
/// ```json
/// { "username": "alice", "password": "Secret123!" }
/// ```
///
/// # Response
/// ```json
/// { "id": "<uuid>", "username": "alice" }
/// ```
pub async fn register(
    Extension(state): Extension<Arc<AppState>>,
    JsonBody(payload): JsonBody<CredentialsRequest>,
) -> Result<Json<UserSummary>, ApiError> {
    let validation = CredentialsValidator.validate(&payload);
    if !validation.is_valid {
        return Err(ApiError::from(validation));
    }

    match state
        .credentials
        .create_user(&payload.username, &payload.password)
        .await
    {
        Ok(user) => Ok(Json(UserSummary::from(&user))),
        Err(CredentialError::Rejected(errors)) => {
            info!(
                username = %payload.username,
                violations = errors.len(),
                "Registration rejected"
            );
            Err(ApiError::ValidationError(errors))
        }
        Err(e) => Err(credential_failure(e)),
    }
}

/// POST /auth/login
/// Exchanges username and password for a bearer token
///
/// # Response
/// ```json
/// { "token": "<jwt>" }
/// ```
pub async fn login(
    Extension(state): Extension<Arc<AppState>>,
    JsonBody(payload): JsonBody<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let validation = CredentialsValidator.validate(&payload);
    if !validation.is_valid {
        return Err(ApiError::from(validation));
    }

    let user = state
        .credentials
        .find_by_username(&payload.username)
        .await
        .map_err(credential_failure)?;

    // Runs for unknown users too, against a decoy hash
    let verified = state
        .credentials
        .verify_password(user.as_ref(), &payload.password)
        .await
        .map_err(credential_failure)?;

    let user = match user {
        Some(user) if verified => user,
        _ => {
            warn!(username = %payload.username, "Login failed");
            return Err(ApiError::Unauthorized(LOGIN_FAILED.to_string()));
        }
    };

    let token = state
        .tokens
        .issue(&user)
        .map_err(|e| ApiError::InternalServer(e.to_string()))?;

    info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse { token }))
}

/// GET /auth/me
pub async fn me_handler(authed: AuthedUser) -> Json<UserSummary> {
    Json(UserSummary {
        id: authed.id,
        username: authed.username,
    })
}

/// GET /auth/{provider}-login
/// Redirects the browser to the provider's consent page
pub async fn oauth_login(
    Extension(state): Extension<Arc<AppState>>,
    Extension(route): Extension<ProviderRoute>,
) -> Result<Response, ApiError> {
    let provider = configured_provider(&state, route)?;

    info!(provider = provider.name(), "Starting OAuth flow");
    Ok(found(&provider.authorization_url()))
}

/// GET /auth/{provider}-callback?code=
/// Completes the OAuth flow and hands a token to the frontend
///
/// Every failure after the code check lands on the frontend as `?error=` with a
/// fixed message; the cause is only logged.
pub async fn oauth_callback(
    Extension(state): Extension<Arc<AppState>>,
    Extension(route): Extension<ProviderRoute>,
    QueryParams(query): QueryParams<OAuthCallbackQuery>,
) -> Result<Response, ApiError> {
    let provider = configured_provider(&state, route)?;

    let code = match query.code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code,
        _ => {
            warn!(provider = provider.name(), "OAuth callback without authorization code");
            return Err(ApiError::BadRequest(
                "Authorization code is missing".to_string(),
            ));
        }
    };

    info!(
        provider = provider.name(),
        code = %safe_token_log(code),
        "Received OAuth callback"
    );

    let location = match state
        .oauth
        .complete_sign_in(provider, code, state.credentials.as_ref(), &state.tokens)
        .await
    {
        Ok(sign_in) => frontend_redirect(
            &state.frontend_url,
            provider.name(),
            &[
                ("token", sign_in.token.as_str()),
                ("username", sign_in.username.as_str()),
            ],
        ),
        Err(e) => {
            error!(provider = provider.name(), error = %e, "OAuth sign-in failed");
            let message = format!(
                "{} sign-in failed. Please try again.",
                provider.kind.display_name()
            );
            frontend_redirect(&state.frontend_url, provider.name(), &[("error", message.as_str())])
        }
    };

    Ok(found(&location))
}
