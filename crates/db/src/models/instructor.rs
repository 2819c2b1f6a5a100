use locker_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `instructors` table. `id` is the instructor's account id.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Instructor {
    pub id: DbId,
    pub academy_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
