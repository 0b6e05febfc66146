// src/applications/routes.rs

use axum::{routing::get, Router};

use super::handlers;

pub fn applications_routes() -> Router {
    Router::new()
        .route(
            "/applications",
            get(handlers::list_applications).post(handlers::create_application),
        )
        .route(
            "/applications/:id",
            get(handlers::get_application)
                .put(handlers::update_application)
                .delete(handlers::delete_application),
        )
}
