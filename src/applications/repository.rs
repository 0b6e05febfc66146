//! Owner-scoped persistence for job applications
//!
//! Every statement carries `user_id = ?`. A row that exists but belongs to
//! someone else is indistinguishable from a missing one.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::models::{JobApplication, JobApplicationRequest};

#[async_trait]
pub trait JobApplicationRepo: Send + Sync {
    /// Newest first by `date_applied`, ties broken by id
    async fn list_all(&self, owner: &str) -> Result<Vec<JobApplication>, sqlx::Error>;

    async fn get_by_id(&self, owner: &str, id: i64)
        -> Result<Option<JobApplication>, sqlx::Error>;

    async fn create(
        &self,
        request: &JobApplicationRequest,
        owner: &str,
    ) -> Result<JobApplication, sqlx::Error>;

    /// `false` when no row matched `(id, owner)`
    async fn update(
        &self,
        owner: &str,
        id: i64,
        request: &JobApplicationRequest,
    ) -> Result<bool, sqlx::Error>;

    async fn exists(&self, owner: &str, id: i64) -> Result<bool, sqlx::Error>;

    /// `false` when no row matched `(id, owner)`
    async fn delete(&self, owner: &str, id: i64) -> Result<bool, sqlx::Error>;
}

pub struct SqliteJobApplicationRepo {
    pool: SqlitePool,
}

impl SqliteJobApplicationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn stored_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl JobApplicationRepo for SqliteJobApplicationRepo {
    async fn list_all(&self, owner: &str) -> Result<Vec<JobApplication>, sqlx::Error> {
        sqlx::query_as::<_, JobApplication>(
            "SELECT * FROM job_applications WHERE user_id = ? ORDER BY date_applied DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_by_id(
        &self,
        owner: &str,
        id: i64,
    ) -> Result<Option<JobApplication>, sqlx::Error> {
        sqlx::query_as::<_, JobApplication>(
            "SELECT * FROM job_applications WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create(
        &self,
        request: &JobApplicationRequest,
        owner: &str,
    ) -> Result<JobApplication, sqlx::Error> {
        let date_applied = stored_date(request.date_applied.unwrap_or_else(Utc::now));

        let application = sqlx::query_as::<_, JobApplication>(
            r#"
            INSERT INTO job_applications (company_name, position, status, date_applied, user_id)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(request.company_name.trim())
        .bind(request.position.trim())
        .bind(request.status.trim())
        .bind(&date_applied)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        debug!(application_id = application.id, user_id = %owner, "Job application stored");
        Ok(application)
    }

    async fn update(
        &self,
        owner: &str,
        id: i64,
        request: &JobApplicationRequest,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE job_applications
            SET company_name = ?, position = ?, status = ?,
                date_applied = COALESCE(?, date_applied)
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(request.company_name.trim())
        .bind(request.position.trim())
        .bind(request.status.trim())
        .bind(request.date_applied.map(stored_date))
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, owner: &str, id: i64) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM job_applications WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn delete(&self, owner: &str, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM job_applications WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
