//! Poll loop for thumbnail tasks.
//!
//! Claims use `SELECT FOR UPDATE SKIP LOCKED` via [`JobRepo::claim_next`],
//! so several workers can share one job table.

use std::time::Duration;

use locker_db::models::job::Job;
use locker_db::repositories::JobRepo;
use locker_service::TaskKind;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::thumbnail::ThumbnailProcessor;

/// Default polling interval for the runner loop.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct ThumbnailRunner {
    pool: PgPool,
    processor: ThumbnailProcessor,
    poll_interval: Duration,
}

impl ThumbnailRunner {
    pub fn new(pool: PgPool, processor: ThumbnailProcessor) -> Self {
        Self {
            pool,
            processor,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Thumbnail runner started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Thumbnail runner shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.drain(&cancel).await {
                        tracing::error!(error = %e, "Thumbnail cycle failed");
                    }
                }
            }
        }
    }

    /// Process queued tasks until none are left or shutdown is requested.
    async fn drain(&self, cancel: &CancellationToken) -> Result<(), sqlx::Error> {
        while !cancel.is_cancelled() {
            if !self.run_once().await? {
                break;
            }
        }
        Ok(())
    }

    /// Claim and process one task. Returns `false` when the queue is empty.
    ///
    /// Only claim and bookkeeping errors are returned; a failing task is
    /// recorded on its job row.
    pub async fn run_once(&self) -> Result<bool, sqlx::Error> {
        let Some(job) = JobRepo::claim_next(&self.pool, TaskKind::Thumbnail.as_str()).await? else {
            return Ok(false);
        };
        tracing::debug!(job_id = job.id, attempts = job.attempts, "Thumbnail task claimed");
        self.finish(&job).await?;
        Ok(true)
    }

    async fn finish(&self, job: &Job) -> Result<(), sqlx::Error> {
        match self.processor.process(job).await {
            Ok(outcome) => {
                let result = serde_json::to_value(&outcome).unwrap_or_default();
                JobRepo::complete(&self.pool, job.id, &result).await
            }
            Err(e) => {
                tracing::error!(job_id = job.id, error = %format!("{e:#}"), "Thumbnail task failed");
                JobRepo::fail(&self.pool, job.id, &format!("{e:#}")).await
            }
        }
    }
}
