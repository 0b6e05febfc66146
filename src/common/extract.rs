//! Request extractors shared by every module
//!
//! Each wraps an axum extractor and renders its rejection through
//! [`ApiError`], so malformed input gets the same JSON envelope as every other
//! failure.

use axum::extract::{FromRequest, FromRequestParts};

use super::ApiError;

/// `axum::Json` with an [`ApiError`] rejection
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Path` with an [`ApiError`] rejection
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// `axum::extract::Query` with an [`ApiError`] rejection
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);
