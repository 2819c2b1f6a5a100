//! Repository for the `jobs` table.
//!
//! Uses `JobStatus` from `models::status` for every status transition.

use locker_core::types::DbId;
use sqlx::PgPool;

use crate::models::job::Job;
use crate::models::status::JobStatus;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, job_type, status_id, parameters, result, error_message, attempts, \
    submitted_at, claimed_at, completed_at, created_at, updated_at";

/// Durable task queue operations.
pub struct JobRepo;

impl JobRepo {
    /// Insert a pending job.
    pub async fn enqueue(
        pool: &PgPool,
        job_type: &str,
        parameters: &serde_json::Value,
    ) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (job_type, status_id, parameters) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job_type)
            .bind(JobStatus::Pending.id())
            .bind(parameters)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the oldest pending job of `job_type`.
    ///
    /// Uses `SELECT FOR UPDATE SKIP LOCKED` so several workers can poll the
    /// same table without double-processing.
    pub async fn claim_next(pool: &PgPool, job_type: &str) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs \
             SET status_id = $1, claimed_at = NOW(), attempts = attempts + 1 \
             WHERE id = ( \
                 SELECT id FROM jobs \
                 WHERE status_id = $2 AND job_type = $3 AND claimed_at IS NULL \
                 ORDER BY submitted_at ASC \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(JobStatus::Running.id())
            .bind(JobStatus::Pending.id())
            .bind(job_type)
            .fetch_optional(pool)
            .await
    }

    /// Mark a job as completed with its result payload.
    pub async fn complete(
        pool: &PgPool,
        job_id: DbId,
        result: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs SET status_id = $2, result = $3, completed_at = NOW() WHERE id = $1",
        )
        .bind(job_id)
        .bind(JobStatus::Completed.id())
        .bind(result)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a job as failed. No automatic retry is performed.
    pub async fn fail(pool: &PgPool, job_id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE jobs SET status_id = $2, error_message = $3, completed_at = NOW() WHERE id = $1",
        )
        .bind(job_id)
        .bind(JobStatus::Failed.id())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All jobs of one type, oldest first.
    pub async fn list_by_type(pool: &PgPool, job_type: &str) -> Result<Vec<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE job_type = $1 ORDER BY submitted_at, id");
        sqlx::query_as::<_, Job>(&query)
            .bind(job_type)
            .fetch_all(pool)
            .await
    }
}
