use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

/// Opaque object storage for audio clips.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `key` and return the key.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String, StorageError>;

    /// Issue a time-limited, credential-free GET URL for `key`.
    async fn presign(&self, key: &str, expiry_secs: u32) -> Result<String, StorageError>;
}

/// Client for S3-compatible object storage (AWS S3, R2, MinIO).
pub struct S3BlobStore {
    bucket: Box<Bucket>,
}

impl S3BlobStore {
    /// Connect to `bucket_name`. A custom `endpoint` takes precedence over the named region.
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: Option<&str>,
        access_key: &str,
        secret_key: &str,
        path_style: bool,
    ) -> Result<Self, StorageError> {
        let region = match endpoint {
            Some(endpoint) => Region::Custom {
                region: region.to_string(),
                endpoint: endpoint.to_string(),
            },
            None => region
                .parse::<Region>()
                .map_err(|e| StorageError::Config(e.to_string()))?,
        };

        let credentials =
            Credentials::new(Some(access_key), Some(secret_key), None, None, None)
                .map_err(|e| StorageError::Config(e.to_string()))?;

        let mut bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;
        if path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String, StorageError> {
        self.bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(StorageError::S3)?;
        Ok(key.to_string())
    }

    async fn presign(&self, key: &str, expiry_secs: u32) -> Result<String, StorageError> {
        self.bucket
            .presign_get(key, expiry_secs, None)
            .await
            .map_err(StorageError::S3)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 operation failed: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("Storage configuration error: {0}")]
    Config(String),
}
