//! Fire-and-forget task dispatch.
//!
//! The contract ends at a durable insert: once [`TaskQueue::enqueue`]
//! returns, the worker will eventually see the task. Nothing here waits for
//! processing.

use async_trait::async_trait;
use locker_core::types::DbId;
use locker_db::repositories::JobRepo;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::LockerResult;

/// Kinds of background work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Extract a still frame from an uploaded swing video.
    Thumbnail,
}

impl TaskKind {
    /// Value stored in `jobs.job_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
        }
    }
}

/// Payload of a [`TaskKind::Thumbnail`] task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailTask {
    pub swing_id: DbId,
}

#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Durably record a task. Returns the task id.
    async fn enqueue(&self, kind: TaskKind, payload: serde_json::Value) -> LockerResult<DbId>;
}

/// [`TaskQueue`] backed by the `jobs` table.
#[derive(Debug, Clone)]
pub struct PgTaskQueue {
    pool: PgPool,
}

impl PgTaskQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskQueue for PgTaskQueue {
    async fn enqueue(&self, kind: TaskKind, payload: serde_json::Value) -> LockerResult<DbId> {
        let job = JobRepo::enqueue(&self.pool, kind.as_str(), &payload).await?;
        tracing::debug!(job_id = job.id, job_type = kind.as_str(), "Task enqueued");
        Ok(job.id)
    }
}
