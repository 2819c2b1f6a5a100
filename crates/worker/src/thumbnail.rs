//! Processing of a single thumbnail task.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use locker_core::ffmpeg::{
    extract_frame_thumbnail, has_video_stream, parse_duration, inspect_video, thumbnail_timestamp,
    FfmpegError, THUMBNAIL_WIDTH,
};
use locker_core::media_url::thumbnail_path;
use locker_core::swing_status::SwingStatus;
use locker_core::types::DbId;
use locker_db::models::job::Job;
use locker_db::models::swing::Swing;
use locker_db::repositories::SwingRepo;
use locker_service::ThumbnailTask;
use locker_storage::MediaStore;
use serde::Serialize;
use sqlx::PgPool;

/// Produces a JPEG still from a video file.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    async fn extract(&self, video: &Path, output: &Path) -> Result<(), FfmpegError>;
}

/// [`FrameExtractor`] backed by the `ffprobe` and `ffmpeg` binaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegExtractor;

#[async_trait]
impl FrameExtractor for FfmpegExtractor {
    async fn extract(&self, video: &Path, output: &Path) -> Result<(), FfmpegError> {
        let info = inspect_video(video).await?;
        if !has_video_stream(&info) {
            return Err(FfmpegError::ParseError("no video stream".into()));
        }
        let at = thumbnail_timestamp(parse_duration(&info));
        extract_frame_thumbnail(video, output, at, THUMBNAIL_WIDTH).await
    }
}

/// What happened to a task. Stored as the job result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ThumbnailOutcome {
    Stored { swing_id: DbId, key: String, size: u64 },
    /// The media could not be decoded; `flagged` says whether the swing was
    /// moved to `rejected`.
    Rejected {
        swing_id: DbId,
        reason: String,
        flagged: bool,
    },
    /// Nothing to do.
    Skipped { swing_id: DbId, reason: String },
}

pub struct ThumbnailProcessor {
    pool: PgPool,
    store: Arc<dyn MediaStore>,
    extractor: Arc<dyn FrameExtractor>,
}

impl ThumbnailProcessor {
    pub fn new(pool: PgPool, store: Arc<dyn MediaStore>, extractor: Arc<dyn FrameExtractor>) -> Self {
        Self {
            pool,
            store,
            extractor,
        }
    }

    /// Run one claimed `thumbnail` job.
    ///
    /// Errors mean the job itself failed (bad payload, storage or host
    /// trouble); unreadable media is a successful [`ThumbnailOutcome::Rejected`].
    pub async fn process(&self, job: &Job) -> anyhow::Result<ThumbnailOutcome> {
        let task: ThumbnailTask = serde_json::from_value(job.parameters.clone())
            .context("Invalid thumbnail task payload")?;
        let swing_id = task.swing_id;
        let skipped = |reason: &str| ThumbnailOutcome::Skipped {
            swing_id,
            reason: reason.to_string(),
        };

        let Some(swing) = SwingRepo::find_by_id(&self.pool, swing_id).await? else {
            return Ok(skipped("swing missing or deleted"));
        };
        if !swing.has_video() {
            return Ok(skipped("swing has no video"));
        }
        let Some(key) = self.store.key_for_url(&swing.video_path) else {
            return Ok(skipped("video is not held by the configured store"));
        };
        let thumb_key = thumbnail_path(&key);
        if thumb_key == key {
            return Ok(skipped("video extension has no thumbnail mapping"));
        }

        let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
        let video_file = scratch.path().join("source");
        let thumb_file = scratch.path().join("thumb.jpg");

        self.store
            .fetch_to_path(&key, &video_file)
            .await
            .with_context(|| format!("Failed to fetch {key}"))?;

        match self.extractor.extract(&video_file, &thumb_file).await {
            Ok(()) => {}
            Err(e) if e.is_unreadable_media() => {
                tracing::warn!(swing_id, key = %key, error = %e, "Swing media is unreadable");
                let flagged = self.flag_rejected(&swing).await?;
                return Ok(ThumbnailOutcome::Rejected {
                    swing_id,
                    reason: e.to_string(),
                    flagged,
                });
            }
            Err(e) => return Err(e).context("Frame extraction failed"),
        }

        let jpeg = tokio::fs::read(&thumb_file)
            .await
            .context("ffmpeg produced no thumbnail")?;
        let stored = self
            .store
            .put_object(&thumb_key, "image/jpeg", Bytes::from(jpeg))
            .await
            .with_context(|| format!("Failed to store {thumb_key}"))?;

        tracing::info!(swing_id, key = %stored.key, size = stored.size, "Thumbnail stored");
        Ok(ThumbnailOutcome::Stored {
            swing_id,
            key: stored.key,
            size: stored.size,
        })
    }

    /// Move the swing to `rejected` unless it has already been reviewed.
    async fn flag_rejected(&self, swing: &Swing) -> anyhow::Result<bool> {
        let current = swing.status()?;
        if !current.can_transition_to(SwingStatus::Rejected) {
            tracing::info!(
                swing_id = swing.id,
                status = current.name(),
                "Swing already reviewed, not flagging",
            );
            return Ok(false);
        }
        let updated =
            SwingRepo::transition_status(&self.pool, swing.id, current, SwingStatus::Rejected)
                .await?;
        Ok(updated.is_some())
    }
}
