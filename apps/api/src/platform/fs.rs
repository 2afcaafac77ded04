use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::PlatformError;

/// A file handed to the platform for storage.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Where a blob ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFile {
    pub path: String,
    pub name: String,
    pub size: u64,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `file` under `dir` and returns its path.
    async fn upload(&self, dir: &str, file: UploadFile) -> Result<StoredFile, PlatformError>;

    /// Reads a blob back. `None` when nothing is stored at `path`.
    async fn read(&self, path: &str) -> Result<Option<Bytes>, PlatformError>;

    async fn ping(&self) -> Result<(), PlatformError>;
}

/// Builds a collision-free object path that keeps the original file name readable.
pub fn blob_path(dir: &str, name: &str) -> String {
    let safe_name: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{dir}/{}-{safe_name}", Uuid::new_v4())
}

/// S3 / MinIO backed blob storage.
pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, dir: &str, file: UploadFile) -> Result<StoredFile, PlatformError> {
        let path = blob_path(dir, &file.name);
        let size = file.size();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&path)
            .content_type(&file.content_type)
            .body(ByteStream::from(file.bytes))
            .send()
            .await
            .map_err(|e| PlatformError::Storage(format!("upload {path}: {e}")))?;

        info!("Stored {} ({} bytes) at {}", file.name, size, path);
        Ok(StoredFile {
            path,
            name: file.name,
            size,
        })
    }

    async fn read(&self, path: &str) -> Result<Option<Bytes>, PlatformError> {
        let object = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
        {
            Ok(object) => object,
            Err(e) => {
                if e.as_service_error().map(|se| se.is_no_such_key()) == Some(true) {
                    debug!("No blob at {path}");
                    return Ok(None);
                }
                return Err(PlatformError::Storage(format!("read {path}: {e}")));
            }
        };

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| PlatformError::Storage(format!("read body {path}: {e}")))?;
        Ok(Some(data.into_bytes()))
    }

    async fn ping(&self) -> Result<(), PlatformError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| PlatformError::Storage(format!("bucket {}: {e}", self.bucket)))?;
        Ok(())
    }
}
