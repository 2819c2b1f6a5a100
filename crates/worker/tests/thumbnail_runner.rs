//! Thumbnail runner against a real database and a local media store. Frame
//! extraction is replaced by fakes so the tests do not need ffmpeg.

use std::path::Path;
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use bytes::Bytes;
use locker_core::civil_time::CivilClock;
use locker_core::ffmpeg::FfmpegError;
use locker_core::swing_status::SwingStatus;
use locker_core::types::DbId;
use locker_db::models::status::JobStatus;
use locker_db::models::swing::CreateSwing;
use locker_db::repositories::{JobRepo, SwingRepo};
use locker_service::TaskKind;
use locker_storage::{LocalMediaStore, MediaStore};
use locker_worker::{FrameExtractor, ThumbnailProcessor, ThumbnailRunner};
use serde_json::json;
use sqlx::PgPool;

const PUBLIC_BASE: &str = "http://localhost:3000/media/";
const VIDEO_KEY: &str = "test/swings/2024/03/05/20240305101500-11.mp4";

/// Writes a fixed JPEG payload.
struct FakeFrames;

#[async_trait]
impl FrameExtractor for FakeFrames {
    async fn extract(&self, video: &Path, output: &Path) -> Result<(), FfmpegError> {
        assert!(video.exists());
        tokio::fs::write(output, b"\xFF\xD8fake-jpeg").await.unwrap();
        Ok(())
    }
}

/// Fails the way ffprobe does on a corrupt file.
struct CorruptMedia;

#[async_trait]
impl FrameExtractor for CorruptMedia {
    async fn extract(&self, _video: &Path, _output: &Path) -> Result<(), FfmpegError> {
        Err(FfmpegError::ExecutionFailed {
            exit_code: Some(1),
            stderr: "moov atom not found".into(),
        })
    }
}

/// The binaries are not installed.
struct MissingBinary;

#[async_trait]
impl FrameExtractor for MissingBinary {
    async fn extract(&self, _video: &Path, _output: &Path) -> Result<(), FfmpegError> {
        Err(FfmpegError::NotFound(std::io::ErrorKind::NotFound.into()))
    }
}

struct Fixture {
    pool: PgPool,
    store: Arc<dyn MediaStore>,
    root: tempfile::TempDir,
}

impl Fixture {
    async fn new(pool: PgPool) -> Self {
        let root = tempfile::tempdir().unwrap();
        let store: Arc<dyn MediaStore> =
            Arc::new(LocalMediaStore::new(root.path(), PUBLIC_BASE).await.unwrap());
        Self { pool, store, root }
    }

    fn runner(&self, extractor: impl FrameExtractor + 'static) -> ThumbnailRunner {
        let processor =
            ThumbnailProcessor::new(self.pool.clone(), Arc::clone(&self.store), Arc::new(extractor));
        ThumbnailRunner::new(self.pool.clone(), processor)
    }

    /// An uploaded swing whose video sits in the store.
    async fn uploaded_swing(&self) -> DbId {
        let (account_id,): (DbId,) =
            sqlx::query_as("INSERT INTO accounts (email) VALUES ('golfer@example.com') RETURNING id")
                .fetch_one(&self.pool)
                .await
                .unwrap();
        let swing = SwingRepo::create(
            &self.pool,
            &CreateSwing {
                account_id,
                description: None,
                date_uploaded: CivilClock::default().now(),
            },
        )
        .await
        .unwrap();
        let object = self
            .store
            .put_object(VIDEO_KEY, "video/mp4", Bytes::from_static(b"not really a video"))
            .await
            .unwrap();
        SwingRepo::attach_video(
            &self.pool,
            swing.id,
            &object.url,
            SwingStatus::New,
            SwingStatus::Uploaded,
        )
        .await
            .unwrap()
            .unwrap();
        swing.id
    }

    async fn enqueue(&self, parameters: serde_json::Value) -> DbId {
        JobRepo::enqueue(&self.pool, TaskKind::Thumbnail.as_str(), &parameters)
            .await
            .unwrap()
            .id
    }

    async fn status_of(&self, swing_id: DbId) -> SwingStatus {
        SwingRepo::find_by_id(&self.pool, swing_id)
            .await
            .unwrap()
            .unwrap()
            .status()
            .unwrap()
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn stores_thumbnail_next_to_video(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let swing_id = fx.uploaded_swing().await;
    let job_id = fx.enqueue(json!({ "swing_id": swing_id })).await;

    assert!(fx.runner(FakeFrames).run_once().await.unwrap());

    let thumb = fx.root.path().join("test/swings/2024/03/05/20240305101500-11.jpg");
    assert_eq!(std::fs::read(thumb).unwrap(), b"\xFF\xD8fake-jpeg");

    let job = JobRepo::find_by_id(&fx.pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status_id, JobStatus::Completed.id());
    let result = job.result.unwrap();
    assert_eq!(result["outcome"], "stored");
    assert_eq!(result["key"], "test/swings/2024/03/05/20240305101500-11.jpg");
    assert_eq!(fx.status_of(swing_id).await, SwingStatus::Uploaded);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unreadable_media_flags_swing_rejected(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let swing_id = fx.uploaded_swing().await;
    let job_id = fx.enqueue(json!({ "swing_id": swing_id })).await;

    assert!(fx.runner(CorruptMedia).run_once().await.unwrap());

    assert_eq!(fx.status_of(swing_id).await, SwingStatus::Rejected);
    let job = JobRepo::find_by_id(&fx.pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status_id, JobStatus::Completed.id());
    let result = job.result.unwrap();
    assert_eq!(result["outcome"], "rejected");
    assert_eq!(result["flagged"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unreadable_media_rejects_assigned_swing(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let swing_id = fx.uploaded_swing().await;
    SwingRepo::transition_status(&fx.pool, swing_id, SwingStatus::Uploaded, SwingStatus::Assigned)
        .await
        .unwrap()
        .unwrap();
    let job_id = fx.enqueue(json!({ "swing_id": swing_id })).await;

    fx.runner(CorruptMedia).run_once().await.unwrap();

    assert_eq!(fx.status_of(swing_id).await, SwingStatus::Rejected);
    let job = JobRepo::find_by_id(&fx.pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.result.unwrap()["flagged"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn reviewed_swing_is_not_flagged(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let swing_id = fx.uploaded_swing().await;
    SwingRepo::transition_status(&fx.pool, swing_id, SwingStatus::Uploaded, SwingStatus::Assigned)
        .await
        .unwrap()
        .unwrap();
    SwingRepo::transition_status(&fx.pool, swing_id, SwingStatus::Assigned, SwingStatus::Analyzed)
        .await
        .unwrap()
        .unwrap();
    let job_id = fx.enqueue(json!({ "swing_id": swing_id })).await;

    fx.runner(CorruptMedia).run_once().await.unwrap();

    assert_eq!(fx.status_of(swing_id).await, SwingStatus::Analyzed);
    let job = JobRepo::find_by_id(&fx.pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.result.unwrap()["flagged"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_tools_fail_the_job(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let swing_id = fx.uploaded_swing().await;
    let job_id = fx.enqueue(json!({ "swing_id": swing_id })).await;

    fx.runner(MissingBinary).run_once().await.unwrap();

    let job = JobRepo::find_by_id(&fx.pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status_id, JobStatus::Failed.id());
    assert_matches!(job.error_message.as_deref(), Some(msg) if msg.contains("Frame extraction failed"));
    assert_eq!(fx.status_of(swing_id).await, SwingStatus::Uploaded);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleted_swing_is_skipped(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let swing_id = fx.uploaded_swing().await;
    SwingRepo::soft_delete(&fx.pool, swing_id).await.unwrap();
    let job_id = fx.enqueue(json!({ "swing_id": swing_id })).await;

    fx.runner(FakeFrames).run_once().await.unwrap();

    let job = JobRepo::find_by_id(&fx.pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status_id, JobStatus::Completed.id());
    assert_eq!(job.result.unwrap()["outcome"], "skipped");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn bad_payload_fails_the_job(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    let job_id = fx.enqueue(json!({ "swing": "eleven" })).await;

    fx.runner(FakeFrames).run_once().await.unwrap();

    let job = JobRepo::find_by_id(&fx.pool, job_id).await.unwrap().unwrap();
    assert_eq!(job.status_id, JobStatus::Failed.id());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_queue_reports_idle(pool: PgPool) {
    let fx = Fixture::new(pool).await;
    assert!(!fx.runner(FakeFrames).run_once().await.unwrap());
}
