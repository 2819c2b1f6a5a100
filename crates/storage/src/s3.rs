//! S3-compatible media store (AWS S3, DigitalOcean Spaces, MinIO).
//!
//! Streamed uploads buffer into parts of [`PART_SIZE`]. The multipart upload
//! is only created once the first full part is ready; media smaller than one
//! part is sent with a single `PutObject` on completion.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, ObjectCannedAcl};
use aws_sdk_s3::Client as S3Client;
use bytes::{Bytes, BytesMut};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::config::S3Config;
use crate::{join_url, validate_key, MediaStore, MediaUpload, StorageError, StoredObject};

/// Multipart part size. S3 requires at least 5 MiB for every part but the last.
pub const PART_SIZE: usize = 8 * 1024 * 1024;

fn backend_error<E: std::error::Error>(operation: &str, err: E) -> StorageError {
    StorageError::Backend(format!("{operation}: {}", DisplayErrorContext(err)))
}

#[derive(Debug, Clone)]
pub struct S3MediaStore {
    client: S3Client,
    bucket: String,
    public_url: String,
    public_read: bool,
}

impl S3MediaStore {
    pub async fn new(config: &S3Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key_id.clone(),
                secret.clone(),
                None,
                None,
                "locker-static",
            ));
        }

        let aws_config = loader.load().await;
        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        // Custom endpoint for Spaces/MinIO/LocalStack.
        if let Some(ref endpoint_url) = config.endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }
        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let client = S3Client::from_conf(s3_config_builder.build());

        info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = ?config.endpoint_url,
            "S3 media store initialized"
        );

        Self {
            client,
            bucket: config.bucket.clone(),
            public_url: config.public_url.clone(),
            public_read: config.public_read,
        }
    }

    fn acl(&self) -> Option<ObjectCannedAcl> {
        self.public_read.then_some(ObjectCannedAcl::PublicRead)
    }

    async fn put(&self, key: &str, content_type: &str, body: Bytes) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .set_acl(self.acl())
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| backend_error("PutObject", e))?;
        Ok(())
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn begin_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<Box<dyn MediaUpload>, StorageError> {
        validate_key(key)?;
        Ok(Box::new(S3Upload {
            store: self.clone(),
            key: key.to_string(),
            content_type: content_type.to_string(),
            buffer: BytesMut::with_capacity(PART_SIZE),
            upload_id: None,
            parts: Vec::new(),
            size: 0,
        }))
    }

    #[instrument(skip(self, body), fields(size = body.len()))]
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> Result<StoredObject, StorageError> {
        validate_key(key)?;
        let size = body.len() as u64;
        self.put(key, content_type, body).await?;
        Ok(StoredObject {
            key: key.to_string(),
            size,
            url: self.public_url(key),
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| backend_error("DeleteObject", e))?;
        debug!(key, "Object deleted");
        Ok(())
    }

    #[instrument(skip(self, dest))]
    async fn fetch_to_path(&self, key: &str, dest: &Path) -> Result<(), StorageError> {
        validate_key(key)?;
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    return Err(StorageError::NotFound(key.to_string()));
                }
                return Err(backend_error("GetObject", e));
            }
        };

        let mut body = output.body;
        let mut file = tokio::fs::File::create(dest).await?;
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| backend_error("GetObject body", e))?
        {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_url, key)
    }
}

struct S3Upload {
    store: S3MediaStore,
    key: String,
    content_type: String,
    buffer: BytesMut,
    upload_id: Option<String>,
    parts: Vec<CompletedPart>,
    size: u64,
}

impl S3Upload {
    async fn ensure_multipart(&mut self) -> Result<String, StorageError> {
        if let Some(id) = &self.upload_id {
            return Ok(id.clone());
        }
        let output = self
            .store
            .client
            .create_multipart_upload()
            .bucket(&self.store.bucket)
            .key(&self.key)
            .content_type(&self.content_type)
            .set_acl(self.store.acl())
            .send()
            .await
            .map_err(|e| backend_error("CreateMultipartUpload", e))?;
        let id = output
            .upload_id()
            .ok_or_else(|| StorageError::Backend("No upload ID in response".into()))?
            .to_string();
        debug!(key = %self.key, upload_id = %id, "Multipart upload created");
        self.upload_id = Some(id.clone());
        Ok(id)
    }

    async fn flush_part(&mut self, body: Bytes) -> Result<(), StorageError> {
        let upload_id = self.ensure_multipart().await?;
        let part_number = self.parts.len() as i32 + 1;
        let output = self
            .store
            .client
            .upload_part()
            .bucket(&self.store.bucket)
            .key(&self.key)
            .upload_id(&upload_id)
            .part_number(part_number)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| backend_error("UploadPart", e))?;

        self.parts.push(
            CompletedPart::builder()
                .part_number(part_number)
                .e_tag(output.e_tag().unwrap_or_default())
                .build(),
        );
        Ok(())
    }

    /// Flush the buffered tail and close the upload.
    async fn finish(&mut self) -> Result<(), StorageError> {
        let remainder = self.buffer.split().freeze();

        let Some(upload_id) = self.upload_id.clone() else {
            return self.store.put(&self.key, &self.content_type, remainder).await;
        };

        if !remainder.is_empty() {
            self.flush_part(remainder).await?;
        }

        let completed = CompletedMultipartUpload::builder()
            .set_parts(Some(std::mem::take(&mut self.parts)))
            .build();
        self.store
            .client
            .complete_multipart_upload()
            .bucket(&self.store.bucket)
            .key(&self.key)
            .upload_id(&upload_id)
            .multipart_upload(completed)
            .send()
            .await
            .map_err(|e| backend_error("CompleteMultipartUpload", e))?;

        info!(key = %self.key, size = self.size, "Multipart upload complete");
        Ok(())
    }

    /// Drop any uploaded parts. A no-op when no multipart upload was opened.
    async fn abort_multipart(&self) -> Result<(), StorageError> {
        let Some(upload_id) = &self.upload_id else {
            return Ok(());
        };
        if let Err(e) = self
            .store
            .client
            .abort_multipart_upload()
            .bucket(&self.store.bucket)
            .key(&self.key)
            .upload_id(upload_id)
            .send()
            .await
        {
            warn!(key = %self.key, error = %DisplayErrorContext(&e), "Failed to abort multipart upload");
            return Err(backend_error("AbortMultipartUpload", e));
        }
        debug!(key = %self.key, "Multipart upload aborted");
        Ok(())
    }

    fn stored(&self) -> StoredObject {
        StoredObject {
            key: self.key.clone(),
            size: self.size,
            url: self.store.public_url(&self.key),
        }
    }
}

#[async_trait]
impl MediaUpload for S3Upload {
    async fn write_chunk(&mut self, chunk: Bytes) -> Result<(), StorageError> {
        self.size += chunk.len() as u64;
        self.buffer.extend_from_slice(&chunk);
        while self.buffer.len() >= PART_SIZE {
            let part = self.buffer.split_to(PART_SIZE).freeze();
            self.flush_part(part).await?;
        }
        Ok(())
    }

    fn bytes_written(&self) -> u64 {
        self.size
    }

    async fn complete(mut self: Box<Self>) -> Result<StoredObject, StorageError> {
        if let Err(e) = self.finish().await {
            // The abort error is already logged; the original failure wins.
            let _ = self.abort_multipart().await;
            return Err(e);
        }
        Ok(self.stored())
    }

    async fn abort(self: Box<Self>) -> Result<(), StorageError> {
        self.abort_multipart().await
    }
}
