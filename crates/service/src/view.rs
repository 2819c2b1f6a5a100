//! Record to response shaping.
//!
//! Pure functions of a row plus a [`ViewContext`]; no I/O.

use locker_core::civil_time::CivilClock;
use locker_core::media_url::{absolute_media_url, thumbnail_path, DEFAULT_MEDIA_ORIGIN};
use locker_core::swing_status::SwingStatusId;
use locker_core::types::{DbId, Timestamp};
use locker_db::models::swing::Swing;
use serde::Serialize;

/// Settings needed to render stored paths and civil timestamps.
#[derive(Debug, Clone)]
pub struct ViewContext {
    pub media_origin: String,
    pub clock: CivilClock,
}

impl Default for ViewContext {
    fn default() -> Self {
        Self {
            media_origin: DEFAULT_MEDIA_ORIGIN.to_string(),
            clock: CivilClock::default(),
        }
    }
}

impl ViewContext {
    pub fn new(media_origin: impl Into<String>, clock: CivilClock) -> Self {
        Self {
            media_origin: media_origin.into(),
            clock,
        }
    }

    fn video_url(&self, stored: &str) -> String {
        absolute_media_url(&self.media_origin, stored)
    }

    /// Best effort: the thumbnail object may not exist until the worker
    /// has processed the upload.
    fn thumb_url(&self, stored: &str) -> String {
        absolute_media_url(&self.media_origin, &thumbnail_path(stored))
    }
}

/// One locker item as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwingView {
    pub id: DbId,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub account_id: DbId,
    pub title: Option<String>,
    pub video_url: String,
    pub thumb_url: String,
    pub vimeo_id: String,
    pub status_id: SwingStatusId,
    pub date_uploaded: Timestamp,
}

impl SwingView {
    pub const KIND: &'static str = "video";

    pub fn from_swing(swing: &Swing, ctx: &ViewContext) -> Self {
        Self {
            id: swing.id,
            kind: Self::KIND,
            account_id: swing.account_id,
            title: swing.description.clone(),
            video_url: ctx.video_url(&swing.video_path),
            thumb_url: ctx.thumb_url(&swing.video_path),
            vimeo_id: swing.vimeo_id.clone(),
            status_id: swing.swing_status_id,
            date_uploaded: ctx.clock.to_utc(swing.date_uploaded),
        }
    }
}

/// An analyzed or reviewed swing, as seen from the lesson side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisVideoView {
    pub id: DbId,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub swing_id: DbId,
    pub account_id: DbId,
    pub instructor_id: Option<DbId>,
    pub title: Option<String>,
    pub video_url: String,
    pub thumb_url: String,
    pub status_id: SwingStatusId,
    pub date_uploaded: Timestamp,
    pub date_accepted: Option<Timestamp>,
}

impl AnalysisVideoView {
    pub const KIND: &'static str = "lessonvideo";

    pub fn from_swing(swing: &Swing, ctx: &ViewContext) -> Self {
        Self {
            id: swing.id,
            kind: Self::KIND,
            swing_id: swing.id,
            account_id: swing.account_id,
            instructor_id: swing.instructor_id,
            title: swing.description.clone(),
            video_url: ctx.video_url(&swing.video_path),
            thumb_url: ctx.thumb_url(&swing.video_path),
            status_id: swing.swing_status_id,
            date_uploaded: ctx.clock.to_utc(swing.date_uploaded),
            date_accepted: swing.date_accepted.map(|at| ctx.clock.to_utc(at)),
        }
    }
}
