use std::sync::Arc;

use locker_service::{
    LockerService, PgTaskQueue, TaskQueue, UploadPipeline, UploadSettings, ViewContext,
};
use locker_storage::MediaStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool and service are handle types.
#[derive(Clone)]
pub struct AppState {
    pub pool: locker_db::DbPool,
    pub config: Arc<ServerConfig>,
    pub locker: LockerService,
}

impl AppState {
    /// Wire the locker service to the pool, media store and job queue.
    pub fn new(pool: locker_db::DbPool, config: ServerConfig, store: Arc<dyn MediaStore>) -> Self {
        let locker_cfg = &config.locker;
        let queue: Arc<dyn TaskQueue> = Arc::new(PgTaskQueue::new(pool.clone()));
        let uploads = UploadPipeline::new(
            pool.clone(),
            store,
            queue,
            locker_cfg.clock,
            UploadSettings {
                environment: locker_cfg.environment,
                reupload: locker_cfg.reupload,
            },
        );
        let views = ViewContext::new(locker_cfg.media_origin.clone(), locker_cfg.clock);
        let locker = LockerService::new(pool.clone(), uploads, views);

        Self {
            pool,
            config: Arc::new(config),
            locker,
        }
    }
}
