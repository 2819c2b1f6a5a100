use std::time::Duration;

use locker_storage::StorageConfig;

/// Default seconds between polls of the job table.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub poll_interval: Duration,
    pub storage: StorageConfig,
}

impl WorkerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `WORKER_POLL_INTERVAL_SECS` | `2`     |
    ///
    /// Storage settings are shared with the API server; see
    /// [`StorageConfig::from_env`].
    pub fn from_env() -> Self {
        let secs: u64 = std::env::var("WORKER_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_POLL_INTERVAL_SECS.to_string())
            .parse()
            .expect("WORKER_POLL_INTERVAL_SECS must be a valid u64");
        assert!(secs > 0, "WORKER_POLL_INTERVAL_SECS must be positive");

        Self {
            poll_interval: Duration::from_secs(secs),
            storage: StorageConfig::from_env(),
        }
    }
}
