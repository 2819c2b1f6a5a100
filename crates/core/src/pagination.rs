//! Limit/offset clamping shared by listing queries.

/// Default page size for locker browsing.
pub const DEFAULT_LOCKER_LIMIT: i64 = 100;

/// Default page size for analysis and lesson listings.
pub const DEFAULT_ANALYSIS_LIMIT: i64 = 20;

/// Upper bound on any page.
pub const MAX_LIMIT: i64 = 500;

/// Clamp a user-provided limit to valid bounds.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).max(1).min(max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
