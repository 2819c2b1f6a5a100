/// Failures from a media storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote backend failure, with the SDK's error context flattened.
    #[error("Storage backend error: {0}")]
    Backend(String),
}
