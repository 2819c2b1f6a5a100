//! Shared query parameter types for API handlers.

use locker_core::types::DbId;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Pagination parameters (`?limit=&skip=`).
///
/// Values are clamped in the service layer.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

/// Parse a comma-separated id list such as `?ids=4,8,15`.
///
/// Blank entries are ignored; anything else that is not a positive integer
/// is a bad request.
pub fn parse_id_list(raw: &str) -> AppResult<Vec<DbId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.parse::<DbId>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(AppError::BadRequest(format!("Invalid id '{part}' in ids"))),
        })
        .collect()
}
