//! Read-only access to instructors and instructor relationships.

use locker_core::types::DbId;
use sqlx::PgPool;

use crate::models::instructor::Instructor;

/// Column list for `instructors` queries.
const COLUMNS: &str = "id, academy_id, created_at, updated_at";

pub struct InstructorRepo;

impl InstructorRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Instructor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM instructors WHERE id = $1");
        sqlx::query_as::<_, Instructor>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Whether `instructor_students` links the instructor and the account.
    pub async fn has_student(
        pool: &PgPool,
        instructor_id: DbId,
        account_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS( \
                 SELECT 1 FROM instructor_students \
                 WHERE instructor_id = $1 AND account_id = $2 \
             )",
        )
        .bind(instructor_id)
        .bind(account_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }
}
