//! Swing record models.

use locker_core::swing_status::{SwingStatus, SwingStatusId};
use locker_core::types::{CivilTimestamp, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `swings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Swing {
    pub id: DbId,
    pub account_id: DbId,
    pub instructor_id: Option<DbId>,
    pub description: Option<String>,
    pub video_path: String,
    pub vimeo_id: String,
    pub swing_status_id: SwingStatusId,
    pub deleted: bool,
    pub date_uploaded: CivilTimestamp,
    pub date_accepted: Option<CivilTimestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Swing {
    /// Decode the stored status code.
    ///
    /// The `swing_statuses` foreign key keeps this infallible in practice;
    /// an unknown code means the lookup table and the enum have drifted.
    pub fn status(&self) -> Result<SwingStatus, locker_core::error::CoreError> {
        SwingStatus::from_id(self.swing_status_id)
    }

    pub fn has_video(&self) -> bool {
        !self.video_path.is_empty()
    }
}

/// Insert DTO for a new locker item. Media fields start empty.
#[derive(Debug, Clone)]
pub struct CreateSwing {
    pub account_id: DbId,
    pub description: Option<String>,
    pub date_uploaded: CivilTimestamp,
}

/// Row filter for locker browsing.
#[derive(Debug, Clone, Copy)]
pub enum SwingSelection<'a> {
    /// Exactly these swing ids, whatever their status.
    Ids(&'a [DbId]),
    /// Any swing in one of these statuses.
    Statuses(&'a [SwingStatusId]),
}
