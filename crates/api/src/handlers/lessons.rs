//! Handlers for the `/videolessons` report.

use axum::extract::{Query, State};
use axum::Json;
use locker_core::types::DbId;
use locker_service::AnalysisVideoView;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecentLessonsParams {
    /// Look-back window; absent or `0` means one year.
    #[serde(rename = "daysAgo")]
    pub days_ago: Option<i64>,
    /// Agents only: the instructor to report on.
    pub instructor_id: Option<DbId>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

/// GET /api/v1/videolessons
pub async fn list_recent(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<RecentLessonsParams>,
) -> AppResult<Json<DataResponse<Vec<AnalysisVideoView>>>> {
    let lessons = state
        .locker
        .list_recent_lessons(
            &auth.actor(),
            params.instructor_id,
            params.days_ago,
            params.limit,
            params.skip,
        )
        .await?;
    Ok(Json(DataResponse { data: lessons }))
}
