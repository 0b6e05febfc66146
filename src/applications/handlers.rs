// src/applications/handlers.rs

use axum::{
    extract::{Extension, Json},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

use super::models::{JobApplication, JobApplicationRequest};
use super::validators::ApplicationValidator;
use crate::auth::AuthedUser;
use crate::common::{ApiError, AppState, JsonBody, PathParam, Validator};

fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("Job application with ID {} not found.", id))
}

fn validate(authed: &AuthedUser, request: &JobApplicationRequest) -> Result<(), ApiError> {
    let validation_result = ApplicationValidator.validate(request);
    if !validation_result.is_valid {
        warn!(
            user_id = %authed.id,
            errors = ?validation_result.errors,
            "Job application validation failed"
        );
        return Err(ApiError::from(validation_result));
    }
    Ok(())
}

/// GET /applications - All of the caller's applications
pub async fn list_applications(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
) -> Result<Json<Vec<JobApplication>>, ApiError> {
    let applications = state
        .applications
        .list_all(&authed.id)
        .await
        .map_err(ApiError::DatabaseError)?;

    Ok(Json(applications))
}

/// GET /applications/:id
pub async fn get_application(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<JobApplication>, ApiError> {
    state
        .applications
        .get_by_id(&authed.id, id)
        .await
        .map_err(ApiError::DatabaseError)?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// POST /applications - 201 with a Location header
pub async fn create_application(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<JobApplicationRequest>,
) -> Result<Response, ApiError> {
    validate(&authed, &request)?;

    let application = state
        .applications
        .create(&request, &authed.id)
        .await
        .map_err(ApiError::DatabaseError)?;

    info!(
        user_id = %authed.id,
        application_id = application.id,
        company = %application.company_name,
        "Job application created"
    );

    let location = format!("/applications/{}", application.id);
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(application)).into_response())
}

/// PUT /applications/:id - Full replacement, last write wins
pub async fn update_application(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    PathParam(id): PathParam<i64>,
    JsonBody(request): JsonBody<JobApplicationRequest>,
) -> Result<StatusCode, ApiError> {
    validate(&authed, &request)?;

    let updated = state
        .applications
        .update(&authed.id, id, &request)
        .await
        .map_err(ApiError::DatabaseError)?;

    if !updated {
        return Err(not_found(id));
    }

    info!(user_id = %authed.id, application_id = id, "Job application updated");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /applications/:id
pub async fn delete_application(
    Extension(state): Extension<Arc<AppState>>,
    authed: AuthedUser,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state
        .applications
        .delete(&authed.id, id)
        .await
        .map_err(ApiError::DatabaseError)?;

    if !deleted {
        return Err(not_found(id));
    }

    info!(user_id = %authed.id, application_id = id, "Job application deleted");
    Ok(StatusCode::NO_CONTENT)
}
