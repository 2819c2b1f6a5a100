/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC unless stated otherwise.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Wall-clock time as stored in the `swings` table (no zone attached).
///
/// See [`crate::civil_time`] for the conversion rule.
pub type CivilTimestamp = chrono::NaiveDateTime;
