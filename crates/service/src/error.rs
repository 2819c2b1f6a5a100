use locker_core::error::CoreError;
use locker_storage::StorageError;

/// Errors surfaced by locker operations.
#[derive(Debug, thiserror::Error)]
pub enum LockerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type LockerResult<T> = Result<T, LockerError>;
