pub mod health;
pub mod lessons;
pub mod locker;

use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /locker                              list own locker, create item
/// /locker/upload                       upload media (own timeout)
/// /locker/assignSwings                 assign swings to an instructor
/// /locker/{id}                         list an account's locker, delete a swing
/// /locker/{id}/analysis                analysis videos for a swing
/// /locker/{id}/review                  record an instructor review
///
/// /videolessons                        recent lessons for an instructor
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .merge(locker::router())
        .merge(lessons::router())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .merge(locker::upload_router(Duration::from_secs(
            config.upload_timeout_secs,
        )))
}
