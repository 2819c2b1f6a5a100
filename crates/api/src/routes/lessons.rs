use axum::routing::get;
use axum::Router;

use crate::handlers::lessons;
use crate::state::AppState;

/// `GET /videolessons -> list_recent`
pub fn router() -> Router<AppState> {
    Router::new().route("/videolessons", get(lessons::list_recent))
}
