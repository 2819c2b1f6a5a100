//! Streaming upload pipeline.
//!
//! Order of effects for one upload:
//!
//! 1. Validate headers (id, declared length, content type). No I/O yet.
//! 2. Load the swing and check ownership, status and re-upload policy.
//! 3. Stream the body into a storage sink, re-chunked to
//!    [`UPLOAD_CHUNK_SIZE`] and bounded by the declared length.
//! 4. Point the record at the stored object and move it to `uploaded`
//!    (an `assigned` swing that had no video keeps its status).
//! 5. Enqueue a thumbnail task.
//!
//! A failure in 3 aborts the sink and leaves the record untouched. A failure
//! in 4 deletes the stored object.

use std::fmt::Display;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use locker_core::civil_time::CivilClock;
use locker_core::error::CoreError;
use locker_core::policy::authorize_upload;
use locker_core::roles::Actor;
use locker_core::types::DbId;
use locker_core::upload::{
    build_video_key, validate_declared_length, AppEnvironment, ReuploadPolicy, UploadContentType,
    UPLOAD_CHUNK_SIZE,
};
use locker_db::models::swing::Swing;
use locker_db::repositories::SwingRepo;
use locker_storage::{MediaStore, MediaUpload, StoredObject};
use sqlx::PgPool;

use crate::error::{LockerError, LockerResult};
use crate::queue::{TaskKind, TaskQueue, ThumbnailTask};

/// Environment-dependent pipeline behaviour.
#[derive(Debug, Clone, Copy)]
pub struct UploadSettings {
    pub environment: AppEnvironment,
    pub reupload: ReuploadPolicy,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            environment: AppEnvironment::Local,
            reupload: ReuploadPolicy::Overwrite,
        }
    }
}

/// Header-level description of one upload.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub swing_id: Option<DbId>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
}

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub swing: Swing,
    pub object: StoredObject,
}

#[derive(Clone)]
pub struct UploadPipeline {
    pool: PgPool,
    store: Arc<dyn MediaStore>,
    queue: Arc<dyn TaskQueue>,
    clock: CivilClock,
    settings: UploadSettings,
}

impl UploadPipeline {
    pub fn new(
        pool: PgPool,
        store: Arc<dyn MediaStore>,
        queue: Arc<dyn TaskQueue>,
        clock: CivilClock,
        settings: UploadSettings,
    ) -> Self {
        Self {
            pool,
            store,
            queue,
            clock,
            settings,
        }
    }

    /// Receive and store the media for one swing.
    pub async fn receive<S, E>(
        &self,
        actor: &Actor,
        request: UploadRequest,
        body: S,
    ) -> LockerResult<UploadOutcome>
    where
        S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
        E: Display + Send,
    {
        let swing_id = request
            .swing_id
            .filter(|id| *id > 0)
            .ok_or_else(|| CoreError::Validation("Missing or invalid swing id".into()))?;
        let declared = validate_declared_length(request.content_length)?;
        let content_type = UploadContentType::parse(request.content_type.as_deref())?;

        let swing = SwingRepo::find_by_id(&self.pool, swing_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Swing",
                id: swing_id,
            })?;
        authorize_upload(actor, swing.account_id)?;
        let current = swing.status()?;
        let next = current.after_upload(swing.has_video())?;
        self.settings.reupload.check(&swing.video_path)?;

        let key = build_video_key(
            self.clock.now(),
            swing_id,
            content_type,
            self.settings.environment,
        );
        tracing::info!(
            swing_id,
            account_id = actor.account_id,
            key = %key,
            declared_bytes = declared,
            content_type = content_type.mime(),
            "Receiving swing upload",
        );

        let sink = self.store.begin_upload(&key, content_type.mime()).await?;
        let sink = copy_bounded(body, sink, declared).await?;
        let object = sink.complete().await?;

        let swing = match SwingRepo::attach_video(&self.pool, swing_id, &object.url, current, next).await {
            Ok(Some(swing)) => swing,
            Ok(None) => {
                self.discard(&object).await;
                return Err(CoreError::Conflict(
                    "Swing is no longer accepting uploads".into(),
                )
                .into());
            }
            Err(e) => {
                self.discard(&object).await;
                return Err(e.into());
            }
        };

        let payload = serde_json::to_value(ThumbnailTask { swing_id })
            .map_err(|e| CoreError::Internal(format!("Failed to encode thumbnail task: {e}")))?;
        match self.queue.enqueue(TaskKind::Thumbnail, payload).await {
            Ok(task_id) => tracing::debug!(swing_id, task_id, "Thumbnail task enqueued"),
            // A lost thumbnail task does not fail the upload.
            Err(e) => tracing::error!(swing_id, error = %e, "Failed to enqueue thumbnail task"),
        }

        tracing::info!(swing_id, size = object.size, url = %object.url, "Swing upload stored");
        Ok(UploadOutcome { swing, object })
    }

    async fn discard(&self, object: &StoredObject) {
        if let Err(e) = self.store.delete(&object.key).await {
            tracing::error!(key = %object.key, error = %e, "Failed to delete orphaned upload");
        }
    }
}

/// Copy `body` into `sink` in fixed-size chunks, enforcing `declared` bytes
/// exactly. On any failure the sink is aborted before the error is returned.
pub async fn copy_bounded<S, E>(
    mut body: S,
    mut sink: Box<dyn MediaUpload>,
    declared: u64,
) -> LockerResult<Box<dyn MediaUpload>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
    E: Display + Send,
{
    match pump(&mut body, sink.as_mut(), declared).await {
        Ok(()) => Ok(sink),
        Err(e) => {
            if let Err(abort_err) = sink.abort().await {
                tracing::warn!(error = %abort_err, "Failed to abort upload sink");
            }
            Err(e)
        }
    }
}

async fn pump<S, E>(body: &mut S, sink: &mut dyn MediaUpload, declared: u64) -> LockerResult<()>
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin,
    E: Display + Send,
{
    let mut received: u64 = 0;
    let mut buffer = BytesMut::with_capacity(UPLOAD_CHUNK_SIZE);

    while let Some(next) = body.next().await {
        let data = next.map_err(|e| {
            CoreError::Validation(format!("Upload stream interrupted after {received} bytes: {e}"))
        })?;
        received += data.len() as u64;
        if received > declared {
            return Err(CoreError::PayloadTooLarge(format!(
                "Upload exceeds declared Content-Length of {declared} bytes"
            ))
            .into());
        }
        buffer.extend_from_slice(&data);
        while buffer.len() >= UPLOAD_CHUNK_SIZE {
            sink.write_chunk(buffer.split_to(UPLOAD_CHUNK_SIZE).freeze())
                .await
                .map_err(LockerError::from)?;
        }
    }

    if received < declared {
        return Err(CoreError::Validation(format!(
            "Upload ended after {received} of {declared} declared bytes"
        ))
        .into());
    }
    if !buffer.is_empty() {
        sink.write_chunk(buffer.freeze()).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use futures::stream;
    use locker_storage::StorageError;

    use super::*;

    /// Records every chunk and how the sink was finished.
    #[derive(Default)]
    struct Recorded {
        chunks: Vec<usize>,
        aborted: bool,
    }

    struct RecordingSink(Arc<Mutex<Recorded>>, u64);

    #[async_trait]
    impl MediaUpload for RecordingSink {
        async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StorageError> {
            self.1 += chunk.len() as u64;
            self.0.lock().unwrap().chunks.push(chunk.len());
            Ok(())
        }

        fn bytes_written(&self) -> u64 {
            self.1
        }

        async fn complete(self: Box<Self>) -> Result<StoredObject, StorageError> {
            Ok(StoredObject {
                key: "k".into(),
                size: self.1,
                url: "u".into(),
            })
        }

        async fn abort(self: Box<Self>) -> Result<(), StorageError> {
            self.0.lock().unwrap().aborted = true;
            Ok(())
        }
    }

    fn sink() -> (Arc<Mutex<Recorded>>, Box<dyn MediaUpload>) {
        let rec = Arc::new(Mutex::new(Recorded::default()));
        (Arc::clone(&rec), Box::new(RecordingSink(rec, 0)))
    }

    fn body(sizes: &[usize]) -> impl Stream<Item = Result<Bytes, String>> + Send + Unpin {
        let parts: Vec<Result<Bytes, String>> =
            sizes.iter().map(|n| Ok(Bytes::from(vec![7u8; *n]))).collect();
        stream::iter(parts)
    }

    #[tokio::test]
    async fn rechunks_into_fixed_size_writes() {
        let (rec, sink) = sink();
        let total = UPLOAD_CHUNK_SIZE * 2 + 10;
        let sink = copy_bounded(body(&[1000, total - 1000]), sink, total as u64)
            .await
            .unwrap();
        assert_eq!(sink.bytes_written(), total as u64);
        let rec = rec.lock().unwrap();
        assert_eq!(rec.chunks, vec![UPLOAD_CHUNK_SIZE, UPLOAD_CHUNK_SIZE, 10]);
        assert!(!rec.aborted);
    }

    #[tokio::test]
    async fn overrun_aborts_with_payload_too_large() {
        let (rec, sink) = sink();
        let err = copy_bounded(body(&[60, 50]), sink, 100).await.err().unwrap();
        assert_matches!(err, LockerError::Core(CoreError::PayloadTooLarge(_)));
        assert!(rec.lock().unwrap().aborted);
    }

    #[tokio::test]
    async fn underrun_aborts_with_validation_error() {
        let (rec, sink) = sink();
        let err = copy_bounded(body(&[40]), sink, 100).await.err().unwrap();
        assert_matches!(err, LockerError::Core(CoreError::Validation(_)));
        assert!(rec.lock().unwrap().aborted);
    }

    #[tokio::test]
    async fn stream_error_aborts() {
        let (rec, sink) = sink();
        let parts: Vec<Result<Bytes, String>> =
            vec![Ok(Bytes::from_static(b"abc")), Err("connection reset".into())];
        let err = copy_bounded(stream::iter(parts), sink, 100).await.err().unwrap();
        assert_matches!(err, LockerError::Core(CoreError::Validation(msg)) if msg.contains("connection reset"));
        assert!(rec.lock().unwrap().aborted);
    }
}
