//! Locker service: the operations behind the `/locker` and `/videolessons`
//! routes.

use bytes::Bytes;
use futures::Stream;
use locker_core::civil_time::CivilClock;
use locker_core::error::CoreError;
use locker_core::pagination::{
    clamp_limit, clamp_offset, DEFAULT_ANALYSIS_LIMIT, DEFAULT_LOCKER_LIMIT, MAX_LIMIT,
};
use locker_core::policy::{
    authorize_assignment, authorize_delete, authorize_review, confirm_student_scope,
    lesson_window_days, resolve_lesson_instructor, AnalysisScope, LockerScope,
};
use locker_core::roles::Actor;
use locker_core::swing_status::{status_ids, SwingStatus, LESSON_STATUSES, LOCKER_BROWSE_STATUSES};
use locker_core::types::DbId;
use locker_db::models::swing::{CreateSwing, SwingSelection};
use locker_db::repositories::{InstructorRepo, SwingRepo};
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::LockerResult;
use crate::upload::{UploadPipeline, UploadRequest};
use crate::view::{AnalysisVideoView, SwingView, ViewContext};

/// Longest accepted locker item description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Most swings one assignment request may name.
pub const MAX_ASSIGN_BATCH: usize = 100;

/// Path clients upload media to, with the swing id appended.
pub const UPLOAD_PATH: &str = "/api/v1/locker/upload";

/// Listing parameters for a locker.
#[derive(Debug, Clone, Default)]
pub struct LockerQuery {
    /// Whose locker; `None` means the actor's own.
    pub account_id: Option<DbId>,
    /// Exact swing ids. When present the status filter is not applied.
    pub ids: Option<Vec<DbId>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Outcome of an instructor review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    Analyzed,
    Rejected,
}

impl ReviewOutcome {
    pub fn status(self) -> SwingStatus {
        match self {
            Self::Analyzed => SwingStatus::Analyzed,
            Self::Rejected => SwingStatus::Rejected,
        }
    }
}

/// A freshly created locker item and where to upload its video.
#[derive(Debug, Clone)]
pub struct CreatedItem {
    pub swing: SwingView,
    pub upload_location: String,
}

#[derive(Clone)]
pub struct LockerService {
    pool: PgPool,
    uploads: UploadPipeline,
    views: ViewContext,
    clock: CivilClock,
}

impl LockerService {
    pub fn new(pool: PgPool, uploads: UploadPipeline, views: ViewContext) -> Self {
        let clock = views.clock;
        Self {
            pool,
            uploads,
            views,
            clock,
        }
    }

    /// Create an empty locker item owned by the actor.
    pub async fn create_item(
        &self,
        actor: &Actor,
        description: Option<String>,
    ) -> LockerResult<CreatedItem> {
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if let Some(d) = &description {
            if d.chars().count() > MAX_DESCRIPTION_CHARS {
                return Err(CoreError::Validation(format!(
                    "Description must be at most {MAX_DESCRIPTION_CHARS} characters"
                ))
                .into());
            }
        }

        let swing = SwingRepo::create(
            &self.pool,
            &CreateSwing {
                account_id: actor.account_id,
                description,
                date_uploaded: self.clock.now(),
            },
        )
        .await?;
        tracing::info!(swing_id = swing.id, account_id = actor.account_id, "Locker item created");

        Ok(CreatedItem {
            upload_location: format!("{UPLOAD_PATH}?id={}", swing.id),
            swing: SwingView::from_swing(&swing, &self.views),
        })
    }

    /// Browse a locker.
    ///
    /// Without explicit ids only `new` and `uploaded` swings are returned.
    pub async fn list_locker(&self, actor: &Actor, query: LockerQuery) -> LockerResult<Vec<SwingView>> {
        let scope = LockerScope::resolve(actor, query.account_id);
        if let LockerScope::StudentOf {
            instructor_id,
            account_id,
        } = scope
        {
            let linked = InstructorRepo::has_student(&self.pool, instructor_id, account_id).await?;
            confirm_student_scope(account_id, linked)?;
        }

        let limit = clamp_limit(query.limit, DEFAULT_LOCKER_LIMIT, MAX_LIMIT);
        let offset = clamp_offset(query.offset);
        let statuses = status_ids(&LOCKER_BROWSE_STATUSES);
        let selection = match query.ids.as_deref() {
            Some(ids) if !ids.is_empty() => SwingSelection::Ids(ids),
            _ => SwingSelection::Statuses(&statuses),
        };

        let swings =
            SwingRepo::list_for_account(&self.pool, scope.account_id(), selection, limit, offset)
                .await?;
        Ok(swings
            .iter()
            .map(|s| SwingView::from_swing(s, &self.views))
            .collect())
    }

    /// Analysis for one swing, visible to its instructor, its owner or an
    /// agent.
    pub async fn list_analysis(
        &self,
        actor: &Actor,
        swing_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> LockerResult<Vec<AnalysisVideoView>> {
        let swings = SwingRepo::list_analysis(
            &self.pool,
            swing_id,
            AnalysisScope::for_actor(actor),
            clamp_limit(limit, DEFAULT_ANALYSIS_LIMIT, MAX_LIMIT),
            clamp_offset(offset),
        )
        .await?;
        Ok(swings
            .iter()
            .map(|s| AnalysisVideoView::from_swing(s, &self.views))
            .collect())
    }

    /// Reviewed swings for one instructor over the last `days_ago` days.
    pub async fn list_recent_lessons(
        &self,
        actor: &Actor,
        instructor_override: Option<DbId>,
        days_ago: Option<i64>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> LockerResult<Vec<AnalysisVideoView>> {
        let instructor_id = resolve_lesson_instructor(actor, instructor_override)?;
        let days = lesson_window_days(days_ago)?;
        let since = self.clock.days_ago(days);

        let swings = SwingRepo::list_recent_lessons(
            &self.pool,
            instructor_id,
            &status_ids(&LESSON_STATUSES),
            since,
            clamp_limit(limit, DEFAULT_ANALYSIS_LIMIT, MAX_LIMIT),
            clamp_offset(offset),
        )
        .await?;
        Ok(swings
            .iter()
            .map(|s| AnalysisVideoView::from_swing(s, &self.views))
            .collect())
    }

    /// Assign a batch of swings to an instructor.
    ///
    /// All-or-nothing: any missing swing, foreign swing or illegal status
    /// aborts the whole batch before anything is written.
    pub async fn assign_swings(
        &self,
        actor: &Actor,
        instructor_id: DbId,
        swing_ids: &[DbId],
    ) -> LockerResult<Vec<SwingView>> {
        let mut ids = swing_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Err(CoreError::Validation("swing_ids must not be empty".into()).into());
        }
        if ids.len() > MAX_ASSIGN_BATCH {
            return Err(CoreError::Validation(format!(
                "At most {MAX_ASSIGN_BATCH} swings may be assigned at once"
            ))
            .into());
        }

        InstructorRepo::find_by_id(&self.pool, instructor_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Instructor",
                id: instructor_id,
            })?;

        let acting_for_instructor = actor.is_agent() || actor.account_id == instructor_id;
        let linked = if acting_for_instructor {
            false
        } else {
            InstructorRepo::has_student(&self.pool, instructor_id, actor.account_id).await?
        };
        authorize_assignment(actor, instructor_id, linked)?;

        let mut tx = self.pool.begin().await?;
        let locked = SwingRepo::lock_for_update(&mut tx, &ids).await?;

        if let Some(missing) = ids.iter().find(|id| !locked.iter().any(|s| s.id == **id)) {
            return Err(CoreError::NotFound {
                entity: "Swing",
                id: *missing,
            }
            .into());
        }
        for swing in &locked {
            // A student may hand their own swings to a linked instructor but
            // not anyone else's.
            if !acting_for_instructor && swing.account_id != actor.account_id {
                return Err(CoreError::Forbidden("Unauthorized".into()).into());
            }
            swing.status()?.validate_transition(SwingStatus::Assigned)?;
        }

        let accepted_at = self.clock.now();
        let updated = SwingRepo::mark_assigned(&mut tx, &ids, instructor_id, accepted_at).await?;
        tx.commit().await?;

        tracing::info!(
            instructor_id,
            actor_id = actor.account_id,
            count = updated.len(),
            "Swings assigned",
        );
        Ok(updated
            .iter()
            .map(|s| SwingView::from_swing(s, &self.views))
            .collect())
    }

    /// Store uploaded media for a swing. See [`UploadPipeline::receive`].
    pub async fn receive_upload<S, E>(
        &self,
        actor: &Actor,
        request: UploadRequest,
        body: S,
    ) -> LockerResult<SwingView>
    where
        S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
        E: std::fmt::Display + Send,
    {
        let outcome = self.uploads.receive(actor, request, body).await?;
        Ok(SwingView::from_swing(&outcome.swing, &self.views))
    }

    /// Soft-delete a locker item.
    pub async fn delete_item(&self, actor: &Actor, swing_id: DbId) -> LockerResult<()> {
        let not_found = || CoreError::NotFound {
            entity: "Swing",
            id: swing_id,
        };
        let swing = SwingRepo::find_by_id(&self.pool, swing_id)
            .await?
            .ok_or_else(not_found)?;
        authorize_delete(actor, swing.account_id)?;

        if !SwingRepo::soft_delete(&self.pool, swing_id).await? {
            return Err(not_found().into());
        }
        tracing::info!(swing_id, actor_id = actor.account_id, "Locker item deleted");
        Ok(())
    }

    /// Record the instructor's verdict on an assigned swing.
    pub async fn record_review(
        &self,
        actor: &Actor,
        swing_id: DbId,
        outcome: ReviewOutcome,
    ) -> LockerResult<AnalysisVideoView> {
        let swing = SwingRepo::find_by_id(&self.pool, swing_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Swing",
                id: swing_id,
            })?;
        authorize_review(actor, swing.instructor_id)?;

        let current = swing.status()?;
        if current != SwingStatus::Assigned {
            return Err(CoreError::Conflict(format!(
                "Only assigned swings can be reviewed, swing is '{}'",
                current.name()
            ))
            .into());
        }
        current.validate_transition(outcome.status())?;

        let updated =
            SwingRepo::transition_status(&self.pool, swing_id, current, outcome.status())
                .await?
                .ok_or_else(|| CoreError::Conflict("Swing changed during review".into()))?;

        tracing::info!(swing_id, outcome = outcome.status().name(), "Swing reviewed");
        Ok(AnalysisVideoView::from_swing(&updated, &self.views))
    }
}
