//! Swing lifecycle state machine.
//!
//! Discriminants match the `swing_statuses` seed data, which keeps the
//! legacy numeric codes (0-based) used by existing clients.
//!
//! ```text
//! new ──upload──▶ uploaded ──assign──▶ assigned ──review──▶ analyzed
//!  │                 │  ▲                 │  ▲
//!  │                 │  └─re-upload       │  └─re-assign
//!  └────assign───────┼───────────────────▶│
//!  └──────┬──────────┘                    └─review / broken media─▶ rejected
//!         └─────────broken media─────────────────────▶ rejected
//! ```
//!
//! A swing can be assigned before its video arrives. The owner may still
//! upload once onto such a swing; it stays `assigned`.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status ID type matching SMALLINT in the database.
pub type SwingStatusId = i16;

#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwingStatus {
    /// Created, no video yet.
    New = 0,
    /// An instructor has claimed the swing for review.
    Assigned = 1,
    /// Flagged as broken or incomplete.
    Rejected = 2,
    /// The instructor produced analysis content.
    Analyzed = 3,
    /// Video stored and waiting for an instructor.
    Uploaded = 4,
}

/// Statuses shown when browsing a locker without explicit ids.
pub const LOCKER_BROWSE_STATUSES: [SwingStatus; 2] = [SwingStatus::New, SwingStatus::Uploaded];

/// Statuses returned by the recent-lessons report.
pub const LESSON_STATUSES: [SwingStatus; 2] = [SwingStatus::Analyzed, SwingStatus::Rejected];

impl SwingStatus {
    /// Return the database status ID.
    pub fn id(self) -> SwingStatusId {
        self as SwingStatusId
    }

    pub fn from_id(id: SwingStatusId) -> Result<Self, CoreError> {
        match id {
            0 => Ok(Self::New),
            1 => Ok(Self::Assigned),
            2 => Ok(Self::Rejected),
            3 => Ok(Self::Analyzed),
            4 => Ok(Self::Uploaded),
            other => Err(CoreError::Internal(format!("Unknown swing status id {other}"))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Assigned => "assigned",
            Self::Rejected => "rejected",
            Self::Analyzed => "analyzed",
            Self::Uploaded => "uploaded",
        }
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: SwingStatus) -> bool {
        use SwingStatus::*;
        matches!(
            (self, next),
            (New, Uploaded)
                | (Uploaded, Uploaded)
                | (New, Assigned)
                | (Uploaded, Assigned)
                | (Assigned, Assigned)
                | (Assigned, Analyzed)
                | (Assigned, Rejected)
                | (New, Rejected)
                | (Uploaded, Rejected)
        )
    }

    /// Status a swing takes once media is stored for it.
    ///
    /// `new` and `uploaded` become `uploaded`. An `assigned` swing keeps its
    /// status but only accepts media while it has none.
    pub fn after_upload(self, has_media: bool) -> Result<SwingStatus, CoreError> {
        match self {
            Self::New | Self::Uploaded => Ok(Self::Uploaded),
            Self::Assigned if !has_media => Ok(Self::Assigned),
            other => Err(CoreError::Conflict(format!(
                "Swing in status '{}' no longer accepts uploads",
                other.name()
            ))),
        }
    }

    /// Like [`can_transition_to`](Self::can_transition_to) but returns a
    /// `Conflict` naming both states.
    pub fn validate_transition(self, next: SwingStatus) -> Result<(), CoreError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Swing cannot move from '{}' to '{}'",
                self.name(),
                next.name()
            )))
        }
    }
}

impl From<SwingStatus> for SwingStatusId {
    fn from(value: SwingStatus) -> Self {
        value as SwingStatusId
    }
}

/// Convert a status list into database ids for `= ANY($n)` binds.
pub fn status_ids(statuses: &[SwingStatus]) -> Vec<SwingStatusId> {
    statuses.iter().map(|s| s.id()).collect()
}
