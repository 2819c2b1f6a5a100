//! Repository for the `swings` table.
//!
//! Every read filters `deleted = false`; a soft-deleted swing is invisible
//! to listings, analysis, lesson reports, uploads and assignment.

use locker_core::policy::AnalysisScope;
use locker_core::swing_status::{SwingStatus, SwingStatusId};
use locker_core::types::{CivilTimestamp, DbId};
use sqlx::{PgConnection, PgPool};

use crate::models::swing::{CreateSwing, Swing, SwingSelection};

/// Column list for `swings` queries.
const COLUMNS: &str = "\
    id, account_id, instructor_id, description, video_path, vimeo_id, \
    swing_status_id, deleted, date_uploaded, date_accepted, \
    created_at, updated_at";

/// Provides queries and state changes for swing records.
pub struct SwingRepo;

impl SwingRepo {
    /// Insert a new locker item in status `new` with empty media fields.
    pub async fn create(pool: &PgPool, input: &CreateSwing) -> Result<Swing, sqlx::Error> {
        let query = format!(
            "INSERT INTO swings (account_id, description, video_path, vimeo_id, swing_status_id, date_uploaded) \
             VALUES ($1, $2, '', '', $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Swing>(&query)
            .bind(input.account_id)
            .bind(&input.description)
            .bind(SwingStatus::New.id())
            .bind(input.date_uploaded)
            .fetch_one(pool)
            .await
    }

    /// Find a non-deleted swing by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Swing>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM swings WHERE id = $1 AND deleted = false");
        sqlx::query_as::<_, Swing>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one account's locker, newest first.
    pub async fn list_for_account(
        pool: &PgPool,
        account_id: DbId,
        selection: SwingSelection<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Swing>, sqlx::Error> {
        let filter = match selection {
            SwingSelection::Ids(_) => "id = ANY($2)",
            SwingSelection::Statuses(_) => "swing_status_id = ANY($2)",
        };
        let query = format!(
            "SELECT {COLUMNS} FROM swings \
             WHERE account_id = $1 AND deleted = false AND {filter} \
             ORDER BY date_uploaded DESC, id DESC \
             LIMIT $3 OFFSET $4"
        );
        let q = sqlx::query_as::<_, Swing>(&query).bind(account_id);
        let q = match selection {
            SwingSelection::Ids(ids) => q.bind(ids),
            SwingSelection::Statuses(statuses) => q.bind(statuses),
        };
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Analyzed swings matching `swing_id`, restricted by the actor's scope.
    pub async fn list_analysis(
        pool: &PgPool,
        swing_id: DbId,
        scope: AnalysisScope,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Swing>, sqlx::Error> {
        let (scope_filter, scoped_id, bind_idx) = match scope {
            AnalysisScope::ByInstructor(id) => ("AND instructor_id = $3", Some(id), 4),
            AnalysisScope::ByAccount(id) => ("AND account_id = $3", Some(id), 4),
            AnalysisScope::Unrestricted => ("", None, 3),
        };
        let query = format!(
            "SELECT {COLUMNS} FROM swings \
             WHERE id = $1 AND swing_status_id = $2 AND deleted = false {scope_filter} \
             ORDER BY date_uploaded DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );

        let mut q = sqlx::query_as::<_, Swing>(&query)
            .bind(swing_id)
            .bind(SwingStatus::Analyzed.id());
        if let Some(id) = scoped_id {
            q = q.bind(id);
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// One instructor's reviewed swings uploaded at or after `since`.
    pub async fn list_recent_lessons(
        pool: &PgPool,
        instructor_id: DbId,
        statuses: &[SwingStatusId],
        since: CivilTimestamp,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Swing>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM swings \
             WHERE instructor_id = $1 AND swing_status_id = ANY($2) \
               AND date_uploaded >= $3 AND deleted = false \
             ORDER BY date_uploaded DESC, id DESC \
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, Swing>(&query)
            .bind(instructor_id)
            .bind(statuses)
            .bind(since)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Lock the named non-deleted swings for the rest of the transaction.
    ///
    /// Rows are locked in id order so concurrent batches cannot deadlock.
    pub async fn lock_for_update(
        conn: &mut PgConnection,
        ids: &[DbId],
    ) -> Result<Vec<Swing>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM swings \
             WHERE id = ANY($1) AND deleted = false \
             ORDER BY id \
             FOR UPDATE"
        );
        sqlx::query_as::<_, Swing>(&query)
            .bind(ids)
            .fetch_all(&mut *conn)
            .await
    }

    /// Assign locked swings to an instructor with one shared acceptance time.
    pub async fn mark_assigned(
        conn: &mut PgConnection,
        ids: &[DbId],
        instructor_id: DbId,
        accepted_at: CivilTimestamp,
    ) -> Result<Vec<Swing>, sqlx::Error> {
        let query = format!(
            "UPDATE swings \
             SET instructor_id = $2, swing_status_id = $3, date_accepted = $4 \
             WHERE id = ANY($1) AND deleted = false \
             RETURNING {COLUMNS}"
        );
        let mut rows = sqlx::query_as::<_, Swing>(&query)
            .bind(ids)
            .bind(instructor_id)
            .bind(SwingStatus::Assigned.id())
            .bind(accepted_at)
            .fetch_all(&mut *conn)
            .await?;
        rows.sort_by_key(|s| s.id);
        Ok(rows)
    }

    /// Record stored media, moving the swing from `from` to `to`.
    ///
    /// Compare-and-set on the status the caller read, so a concurrent
    /// assignment or review wins over a late upload. An `assigned` swing
    /// only matches while it has no media. Returns `None` when nothing
    /// matched.
    pub async fn attach_video(
        pool: &PgPool,
        id: DbId,
        video_path: &str,
        from: SwingStatus,
        to: SwingStatus,
    ) -> Result<Option<Swing>, sqlx::Error> {
        let media_guard = if from == SwingStatus::Assigned {
            "AND video_path = ''"
        } else {
            ""
        };
        let query = format!(
            "UPDATE swings SET video_path = $2, swing_status_id = $3 \
             WHERE id = $1 AND deleted = false AND swing_status_id = $4 {media_guard} \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Swing>(&query)
            .bind(id)
            .bind(video_path)
            .bind(to.id())
            .bind(from.id())
            .fetch_optional(pool)
            .await
    }

    /// Compare-and-set a status change. Returns `None` when the swing is gone
    /// or no longer in `from`.
    pub async fn transition_status(
        pool: &PgPool,
        id: DbId,
        from: SwingStatus,
        to: SwingStatus,
    ) -> Result<Option<Swing>, sqlx::Error> {
        let query = format!(
            "UPDATE swings SET swing_status_id = $3 \
             WHERE id = $1 AND swing_status_id = $2 AND deleted = false \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Swing>(&query)
            .bind(id)
            .bind(from.id())
            .bind(to.id())
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a swing. Returns `false` if it was already deleted or
    /// does not exist.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE swings SET deleted = true WHERE id = $1 AND deleted = false")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
