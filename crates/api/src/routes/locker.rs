//! Route definitions for the `/locker` resource.

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::locker;
use crate::state::AppState;

/// Locker routes other than upload.
///
/// ```text
/// GET    /locker                  -> list_own
/// POST   /locker                  -> create
/// POST   /locker/assignSwings     -> assign
/// GET    /locker/{id}             -> list_account (id is an account)
/// DELETE /locker/{id}             -> delete_item  (id is a swing)
/// GET    /locker/{id}/analysis    -> list_analysis
/// POST   /locker/{id}/review      -> review
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/locker", get(locker::list_own).post(locker::create))
        .route("/locker/assignSwings", post(locker::assign))
        .route(
            "/locker/{id}",
            get(locker::list_account).delete(locker::delete_item),
        )
        .route("/locker/{id}/analysis", get(locker::list_analysis))
        .route("/locker/{id}/review", post(locker::review))
}

/// `PUT /locker/upload`, with no body size limit and a long timeout.
///
/// The declared `Content-Length` is enforced while streaming.
pub fn upload_router(timeout: Duration) -> Router<AppState> {
    Router::new()
        .route("/locker/upload", put(locker::upload))
        .layer(DefaultBodyLimit::disable())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
}
