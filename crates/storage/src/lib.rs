//! Durable media storage for swing videos and thumbnails.
//!
//! [`MediaStore`] is the seam between the upload pipeline and a concrete
//! backend. Uploads are streamed through a [`MediaUpload`] sink which either
//! completes into a stored object or aborts and leaves nothing behind.

pub mod config;
pub mod error;
pub mod local;
pub mod s3;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

pub use config::{S3Config, StorageBackend, StorageConfig};
pub use error::StorageError;
pub use local::LocalMediaStore;
pub use s3::S3MediaStore;

/// A fully written object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
    pub url: String,
}

/// An in-progress streamed write.
///
/// Dropping a sink without calling [`complete`](Self::complete) or
/// [`abort`](Self::abort) may leave backend-side residue (an open multipart
/// upload, a `.partial` file); callers always finish one way or the other.
/// A failed `complete` cleans up after itself before returning the error.
#[async_trait]
pub trait MediaUpload: Send {
    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StorageError>;

    /// Bytes accepted so far.
    fn bytes_written(&self) -> u64;

    async fn complete(self: Box<Self>) -> Result<StoredObject, StorageError>;

    /// Discard everything written so far.
    async fn abort(self: Box<Self>) -> Result<(), StorageError>;
}

#[async_trait]
pub trait MediaStore: Send + Sync + 'static {
    /// Open a streamed write to `key`. Nothing is visible under `key` until
    /// the returned sink completes.
    async fn begin_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<Box<dyn MediaUpload>, StorageError>;

    /// Write a small object in one call.
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<StoredObject, StorageError>;

    /// Remove an object. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Download an object to a local file.
    async fn fetch_to_path(&self, key: &str, dest: &Path) -> Result<(), StorageError>;

    /// Public URL under which `key` is served.
    fn public_url(&self, key: &str) -> String;

    /// Reverse of [`public_url`](Self::public_url); `None` for URLs this
    /// store does not serve.
    fn key_for_url(&self, url: &str) -> Option<String> {
        let base = self.public_url("");
        url.strip_prefix(&base)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}

/// Build the configured backend.
pub async fn build_store(config: &StorageConfig) -> Result<Arc<dyn MediaStore>, StorageError> {
    match config.backend {
        StorageBackend::Local => {
            let store = LocalMediaStore::new(&config.local_root, &config.local_public_url).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::S3 => Ok(Arc::new(S3MediaStore::new(&config.s3).await)),
    }
}

/// Reject keys that could escape the storage root or bucket prefix.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        Err(StorageError::InvalidKey(key.to_string()))
    } else {
        Ok(())
    }
}

/// Join a public base URL and a key with exactly one slash.
pub(crate) fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}
