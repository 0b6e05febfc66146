//! Authentication routes

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};

use super::handlers::{self, ProviderRoute};

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /auth/register` - Password registration
/// - `POST /auth/login` - Password login, returns a bearer token
/// - `GET /auth/me` - Identity carried by the bearer token
/// - `GET /auth/{provider}-login` / `GET /auth/{provider}-callback` - one pair
///   per configured OAuth provider
pub fn auth_routes(providers: &[&'static str]) -> Router {
    let router = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/me", get(handlers::me_handler));

    providers.iter().fold(router, |router, &name| {
        router
            .route(
                &format!("/auth/{}-login", name),
                get(handlers::oauth_login).layer(Extension(ProviderRoute(name))),
            )
            .route(
                &format!("/auth/{}-callback", name),
                get(handlers::oauth_callback).layer(Extension(ProviderRoute(name))),
            )
    })
}
