//! Handlers for the `/locker` resource.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use locker_core::types::DbId;
use locker_service::{AnalysisVideoView, LockerQuery, ReviewOutcome, SwingView, UploadRequest};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::{parse_id_list, PageParams};
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for locker listings.
#[derive(Debug, Deserialize)]
pub struct LockerListParams {
    /// Comma-separated swing ids. When given, any status is returned.
    pub ids: Option<String>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

impl LockerListParams {
    fn into_query(self, account_id: Option<DbId>) -> AppResult<LockerQuery> {
        let ids = self.ids.as_deref().map(parse_id_list).transpose()?;
        Ok(LockerQuery {
            account_id,
            ids,
            limit: self.limit,
            offset: self.skip,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateLockerItemRequest {
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct AssignSwingsRequest {
    pub instructor_id: DbId,
    pub swing_ids: Vec<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub outcome: ReviewOutcome,
}

/// GET /api/v1/locker
pub async fn list_own(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<LockerListParams>,
) -> AppResult<Json<DataResponse<Vec<SwingView>>>> {
    let swings = state
        .locker
        .list_locker(&auth.actor(), params.into_query(None)?)
        .await?;
    Ok(Json(DataResponse { data: swings }))
}

/// GET /api/v1/locker/{account_id}
///
/// Instructors need a recorded relationship with the account; students
/// always get their own locker.
pub async fn list_account(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(account_id): Path<DbId>,
    Query(params): Query<LockerListParams>,
) -> AppResult<Json<DataResponse<Vec<SwingView>>>> {
    let swings = state
        .locker
        .list_locker(&auth.actor(), params.into_query(Some(account_id))?)
        .await?;
    Ok(Json(DataResponse { data: swings }))
}

/// POST /api/v1/locker
///
/// Returns 201 with a `Location` header naming the upload target.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateLockerItemRequest>,
) -> AppResult<impl IntoResponse> {
    let created = state
        .locker
        .create_item(&auth.actor(), input.description)
        .await?;
    Ok((
        StatusCode::CREATED,
        [(LOCATION, created.upload_location)],
        Json(DataResponse {
            data: created.swing,
        }),
    ))
}

/// PUT /api/v1/locker/upload?id={swing_id}
///
/// The raw request body is the video. `Content-Length` and `Content-Type`
/// are required.
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Body,
) -> AppResult<Json<DataResponse<SwingView>>> {
    let request = UploadRequest {
        swing_id: params.id,
        content_length: headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok()),
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let swing = state
        .locker
        .receive_upload(&auth.actor(), request, body.into_data_stream())
        .await?;
    Ok(Json(DataResponse { data: swing }))
}

/// POST /api/v1/locker/assignSwings
pub async fn assign(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<AssignSwingsRequest>,
) -> AppResult<Json<DataResponse<Vec<SwingView>>>> {
    let swings = state
        .locker
        .assign_swings(&auth.actor(), input.instructor_id, &input.swing_ids)
        .await?;
    Ok(Json(DataResponse { data: swings }))
}

/// GET /api/v1/locker/{swing_id}/analysis
pub async fn list_analysis(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(swing_id): Path<DbId>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<DataResponse<Vec<AnalysisVideoView>>>> {
    let videos = state
        .locker
        .list_analysis(&auth.actor(), swing_id, page.limit, page.skip)
        .await?;
    Ok(Json(DataResponse { data: videos }))
}

/// POST /api/v1/locker/{swing_id}/review
pub async fn review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(swing_id): Path<DbId>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<Json<DataResponse<AnalysisVideoView>>> {
    let video = state
        .locker
        .record_review(&auth.actor(), swing_id, input.outcome)
        .await?;
    Ok(Json(DataResponse { data: video }))
}

/// DELETE /api/v1/locker/{swing_id}
pub async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(swing_id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.locker.delete_item(&auth.actor(), swing_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
