//! Filesystem-backed media store for development and tests.
//!
//! Streamed writes go to `<key>.partial` and are renamed into place on
//! completion, so a reader never observes a half-written video.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;

use crate::{join_url, validate_key, MediaStore, MediaUpload, StorageError, StoredObject};

const PARTIAL_SUFFIX: &str = ".partial";

#[derive(Debug, Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    public_base: String,
}

impl LocalMediaStore {
    /// Create the store, making sure `root` exists.
    pub async fn new(root: impl AsRef<Path>, public_base: &str) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            public_base: public_base.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    fn stored(&self, key: &str, size: u64) -> StoredObject {
        StoredObject {
            key: key.to_string(),
            size,
            url: self.public_url(key),
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

async fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn begin_upload(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<Box<dyn MediaUpload>, StorageError> {
        let final_path = self.path_for(key)?;
        ensure_parent(&final_path).await?;
        let partial = partial_path(&final_path);
        let file = tokio::fs::File::create(&partial).await?;
        tracing::debug!(key, path = %partial.display(), "Opened local upload");
        Ok(Box::new(LocalUpload {
            file,
            partial,
            final_path,
            object: self.stored(key, 0),
        }))
    }

    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<StoredObject, StorageError> {
        let mut upload = self.begin_upload(key, content_type).await?;
        if let Err(e) = upload.write_chunk(body).await {
            upload.abort().await?;
            return Err(e);
        }
        upload.complete().await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch_to_path(&self, key: &str, dest: &Path) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::copy(&path, dest).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base, key)
    }
}

struct LocalUpload {
    file: tokio::fs::File,
    partial: PathBuf,
    final_path: PathBuf,
    object: StoredObject,
}

#[async_trait]
impl MediaUpload for LocalUpload {
    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StorageError> {
        self.file.write_all(&chunk).await?;
        self.object.size += chunk.len() as u64;
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.object.size
    }

    async fn complete(self: Box<Self>) -> Result<StoredObject, StorageError> {
        let LocalUpload {
            file,
            partial,
            final_path,
            object,
        } = *self;
        if let Err(e) = persist(file, &partial, &final_path).await {
            if let Err(cleanup) = remove_partial(&partial).await {
                tracing::warn!(path = %partial.display(), error = %cleanup, "Failed to remove partial upload");
            }
            return Err(e);
        }
        tracing::debug!(key = %object.key, size = object.size, "Local upload complete");
        Ok(object)
    }

    async fn abort(self: Box<Self>) -> Result<(), StorageError> {
        let LocalUpload { file, partial, .. } = *self;
        drop(file);
        remove_partial(&partial).await
    }
}

async fn persist(
    mut file: tokio::fs::File,
    partial: &Path,
    final_path: &Path,
) -> Result<(), StorageError> {
    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(partial, final_path).await?;
    Ok(())
}

async fn remove_partial(partial: &Path) -> Result<(), StorageError> {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
