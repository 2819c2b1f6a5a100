//! Shared fixtures for service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream};
use locker_core::civil_time::CivilClock;
use locker_core::types::DbId;
use locker_core::upload::{AppEnvironment, ReuploadPolicy};
use locker_service::{
    LockerService, PgTaskQueue, TaskQueue, UploadPipeline, UploadSettings, ViewContext,
};
use locker_storage::{LocalMediaStore, MediaStore, MediaUpload, StorageError, StoredObject};
use sqlx::PgPool;

pub const PUBLIC_BASE: &str = "http://localhost:3000/media/";

pub async fn seed_account(pool: &PgPool, email: &str) -> DbId {
    let (id,): (DbId,) = sqlx::query_as("INSERT INTO accounts (email) VALUES ($1) RETURNING id")
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap();
    id
}

pub async fn seed_instructor(pool: &PgPool, email: &str) -> DbId {
    let id = seed_account(pool, email).await;
    sqlx::query("INSERT INTO instructors (id) VALUES ($1)")
        .bind(id)
        .execute(pool)
        .await
        .unwrap();
    id
}

pub async fn link_student(pool: &PgPool, instructor_id: DbId, account_id: DbId) {
    sqlx::query("INSERT INTO instructor_students (instructor_id, account_id) VALUES ($1, $2)")
        .bind(instructor_id)
        .bind(account_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn swing_row(pool: &PgPool, id: DbId) -> (i16, String, Option<DbId>, bool) {
    sqlx::query_as(
        "SELECT swing_status_id, video_path, instructor_id, deleted FROM swings WHERE id = $1",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn job_count(pool: &PgPool) -> i64 {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
        .fetch_one(pool)
        .await
        .unwrap();
    n
}

/// Force a swing into a state without going through the service.
pub async fn force_status(pool: &PgPool, id: DbId, status: i16, instructor_id: Option<DbId>) {
    sqlx::query(
        "UPDATE swings SET swing_status_id = $2, instructor_id = $3, \
         video_path = CASE WHEN $2 = 0 THEN '' ELSE 'legacy/clip.mp4' END WHERE id = $1",
    )
    .bind(id)
    .bind(status)
    .bind(instructor_id)
    .execute(pool)
    .await
    .unwrap();
}

pub fn body_of(len: usize) -> impl Stream<Item = Result<Bytes, String>> + Send + Unpin {
    let data = vec![0x42u8; len];
    let parts: Vec<Result<Bytes, String>> = data
        .chunks(4096)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    stream::iter(parts)
}

/// Number of regular files anywhere under `dir`.
pub fn file_count(dir: &std::path::Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|e| {
            let path = e.path();
            if path.is_dir() {
                file_count(&path)
            } else {
                1
            }
        })
        .sum()
}

pub struct Harness {
    pub service: LockerService,
    pub media_root: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

pub async fn harness(pool: &PgPool) -> Harness {
    harness_with(pool, ReuploadPolicy::Overwrite, None).await
}

pub async fn harness_with(
    pool: &PgPool,
    reupload: ReuploadPolicy,
    store_override: Option<Arc<dyn MediaStore>>,
) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let media_root = dir.path().join("media");
    let store: Arc<dyn MediaStore> = match store_override {
        Some(store) => store,
        None => Arc::new(LocalMediaStore::new(&media_root, PUBLIC_BASE).await.unwrap()),
    };
    let queue: Arc<dyn TaskQueue> = Arc::new(PgTaskQueue::new(pool.clone()));
    let clock = CivilClock::default();
    let pipeline = UploadPipeline::new(
        pool.clone(),
        store,
        queue,
        clock,
        UploadSettings {
            environment: AppEnvironment::Testing,
            reupload,
        },
    );
    let service = LockerService::new(pool.clone(), pipeline, ViewContext::new("https://v1sports.com/SwingStore/", clock));
    Harness {
        service,
        media_root,
        _dir: dir,
    }
}

/// A store whose writes always fail.
pub struct FailingStore;

struct FailingUpload;

#[async_trait]
impl MediaUpload for FailingUpload {
    async fn write_chunk(&mut self, _chunk: Bytes) -> Result<(), StorageError> {
        Err(StorageError::Backend("disk full".into()))
    }

    fn bytes_written(&self) -> u64 {
        0
    }

    async fn complete(self: Box<Self>) -> Result<StoredObject, StorageError> {
        Err(StorageError::Backend("disk full".into()))
    }

    async fn abort(self: Box<Self>) -> Result<(), StorageError> {
        Ok(())
    }
}

#[async_trait]
impl MediaStore for FailingStore {
    async fn begin_upload(
        &self,
        _key: &str,
        _content_type: &str,
    ) -> Result<Box<dyn MediaUpload>, StorageError> {
        Ok(Box::new(FailingUpload))
    }

    async fn put_object(
        &self,
        _key: &str,
        _content_type: &str,
        _body: Bytes,
    ) -> Result<StoredObject, StorageError> {
        Err(StorageError::Backend("disk full".into()))
    }

    async fn delete(&self, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }

    async fn fetch_to_path(&self, key: &str, _dest: &std::path::Path) -> Result<(), StorageError> {
        Err(StorageError::NotFound(key.to_string()))
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://failing.example/{key}")
    }
}
