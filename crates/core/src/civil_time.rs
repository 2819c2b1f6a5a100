//! Conversion between UTC and the civil (wall-clock) time stored in `swings`.
//!
//! Legacy rows hold local time without a zone. One fixed offset is applied
//! to every row, configured by `CIVIL_UTC_OFFSET_MINUTES`. Daylight saving
//! is not modelled, so summer timestamps read back one hour off.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use crate::error::CoreError;
use crate::types::{CivilTimestamp, Timestamp};

/// Default offset: UTC-05:00 (US Eastern standard time).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -300;

/// Fixed-offset civil clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilClock {
    offset: FixedOffset,
}

impl Default for CivilClock {
    fn default() -> Self {
        Self::from_offset_minutes(DEFAULT_UTC_OFFSET_MINUTES)
            .expect("default civil offset is within range")
    }
}

impl CivilClock {
    /// Build a clock `minutes` east of UTC (negative for west).
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, CoreError> {
        let offset = FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
            CoreError::Validation(format!("Civil UTC offset out of range: {minutes} minutes"))
        })?;
        Ok(Self { offset })
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    /// Current wall-clock time, suitable for writing to the database.
    pub fn now(&self) -> CivilTimestamp {
        self.to_civil(Utc::now())
    }

    pub fn to_civil(&self, at: Timestamp) -> CivilTimestamp {
        at.with_timezone(&self.offset).naive_local()
    }

    /// Interpret a stored wall-clock value as UTC.
    pub fn to_utc(&self, civil: CivilTimestamp) -> Timestamp {
        match self.offset.from_local_datetime(&civil).single() {
            Some(local) => local.with_timezone(&Utc),
            // Unreachable for a fixed offset.
            None => DateTime::<Utc>::from_naive_utc_and_offset(
                civil - chrono::Duration::seconds(i64::from(self.offset.local_minus_utc())),
                Utc,
            ),
        }
    }

    /// Civil time `days` before now; lower bound for windowed reports.
    pub fn days_ago(&self, days: i64) -> CivilTimestamp {
        self.now() - chrono::Duration::days(days)
    }
}
