// src/applications/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A job application as stored and returned to its owner
#[derive(Clone, FromRow, Serialize, Debug, PartialEq)]
pub struct JobApplication {
    pub id: i64,
    pub company_name: String,
    pub position: String,
    pub status: String,
    /// RFC 3339, UTC, second precision
    pub date_applied: String,
    pub user_id: String,
}

/// Body of `POST /applications` and `PUT /applications/:id`
///
/// Unknown fields, including any `user_id` or `id`, are ignored.
#[derive(Clone, Deserialize, Debug, Default)]
pub struct JobApplicationRequest {
    #[serde(default, alias = "companyName")]
    pub company_name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "dateApplied")]
    pub date_applied: Option<DateTime<Utc>>,
}
