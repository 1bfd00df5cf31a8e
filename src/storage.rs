use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use secrecy::ExposeSecret;

use crate::config::StorageConfig;

/// Validity of download links handed back to callers
pub const PRESIGN_EXPIRY: Duration = Duration::from_secs(3600);

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("transfer of {key} failed: {reason}")]
    Transfer { key: String, reason: String },

    #[error("could not presign {key}: {reason}")]
    Presign { key: String, reason: String },

    #[error("local file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Operations the services need from object storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file to `key`
    async fn upload_file(&self, path: &Path, key: &str) -> Result<(), StorageError>;

    /// Download `key` into `dest`, replacing its contents
    async fn download_file(&self, key: &str, dest: &Path) -> Result<(), StorageError>;

    /// Time-limited, credential-free GET link for `key`
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError>;
}

/// `<prefix>/<id>.wav`
pub fn object_key(prefix: &str, id: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        format!("{}.wav", id)
    } else {
        format!("{}/{}.wav", prefix, id)
    }
}

/// S3 bucket client
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client for the configured region.
    ///
    /// Static credentials are used when both halves are configured, otherwise
    /// the default AWS provider chain applies.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = aws_credential_types::Credentials::new(
                access_key.expose_secret(),
                secret_key.expose_secret(),
                None,
                None,
                "environment",
            );
            loader = loader.credentials_provider(credentials);
        }

        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config), config.bucket.clone())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn upload_file(&self, path: &Path, key: &str) -> Result<(), StorageError> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::Transfer {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("audio/wav")
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Transfer {
                key: key.to_string(),
                reason: DisplayErrorContext(e).to_string(),
            })?;

        tracing::debug!("Uploaded {} to s3://{}/{}", path.display(), self.bucket, key);
        Ok(())
    }

    async fn download_file(&self, key: &str, dest: &Path) -> Result<(), StorageError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let missing = match &err {
                    SdkError::ServiceError(service) => {
                        service.err().is_no_such_key()
                            || matches!(service.raw().status().as_u16(), 403 | 404)
                    }
                    _ => false,
                };
                if missing {
                    return Err(StorageError::NotFound(key.to_string()));
                }
                return Err(StorageError::Transfer {
                    key: key.to_string(),
                    reason: DisplayErrorContext(err).to_string(),
                });
            }
        };

        let mut reader = output.body.into_async_read();
        let mut file = tokio::fs::File::create(dest).await?;
        tokio::io::copy(&mut reader, &mut file).await?;

        tracing::debug!("Downloaded s3://{}/{} to {}", self.bucket, key, dest.display());
        Ok(())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        let presign_error = |reason: String| StorageError::Presign {
            key: key.to_string(),
            reason,
        };

        let config =
            PresigningConfig::expires_in(expires_in).map_err(|e| presign_error(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| presign_error(DisplayErrorContext(e).to_string()))?;

        Ok(request.uri().to_string())
    }
}
