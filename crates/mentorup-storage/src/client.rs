//! S3-compatible object store client (spec §4.2, §6 environment inputs).

use std::path::Path;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Configuration for the object store client, sourced from `STATIC_AWS_*`.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket_name: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Non-AWS S3-compatible deployments may set an explicit endpoint.
    pub endpoint_url: Option<String>,
}

impl S3Config {
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            bucket_name: std::env::var("STATIC_AWS_S3_BUCKET")
                .map_err(|_| StorageError::config_error("STATIC_AWS_S3_BUCKET not set"))?,
            region: std::env::var("STATIC_AWS_REGION")
                .map_err(|_| StorageError::config_error("STATIC_AWS_REGION not set"))?,
            access_key_id: std::env::var("STATIC_AWS_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("STATIC_AWS_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("STATIC_AWS_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("STATIC_AWS_SECRET_ACCESS_KEY not set"))?,
            endpoint_url: std::env::var("STATIC_AWS_ENDPOINT_URL").ok(),
        })
    }
}

/// A narrow façade over object storage: `put`/`get`/`delete_many`/`list`
/// (spec §4.2). Deletion is best-effort and idempotent.
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    bucket: String,
}

impl S3Client {
    pub async fn new(config: S3Config) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "static",
        );

        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        Ok(Self {
            client,
            bucket: config.bucket_name,
        })
    }

    pub async fn from_env() -> StorageResult<Self> {
        let config = S3Config::from_env()?;
        Self::new(config).await
    }

    /// Upload the file at `local_path` to `key`, tagging it with `content_type`.
    pub async fn put(
        &self,
        key: &str,
        local_path: impl AsRef<Path>,
        content_type: &str,
    ) -> StorageResult<()> {
        let local_path = local_path.as_ref();
        debug!("uploading {} to {}", local_path.display(), key);

        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("uploaded {} to {}", local_path.display(), key);
        Ok(())
    }

    /// Upload raw bytes to `key`, tagging it with `content_type`.
    pub async fn put_bytes(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        debug!("uploading {} bytes to {}", data.len(), key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        Ok(())
    }

    /// Download `key` to `local_path`, creating parent directories as needed.
    pub async fn get(&self, key: &str, local_path: impl AsRef<Path>) -> StorageResult<()> {
        let local_path = local_path.as_ref();
        debug!("downloading {} to {}", key, local_path.display());

        let bytes = self.get_bytes(key).await?;
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, bytes).await?;

        info!("downloaded {} to {}", key, local_path.display());
        Ok(())
    }

    /// Download `key` into memory.
    pub async fn get_bytes(&self, key: &str) -> StorageResult<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StorageError::not_found(key)
                } else {
                    StorageError::DownloadFailed(e.to_string())
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(bytes)
    }

    /// Delete every key in `keys`. A missing key is not an error (spec §4.2).
    pub async fn delete_many(&self, keys: &[String]) -> StorageResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        debug!("deleting {} objects", keys.len());

        let objects: Vec<_> = keys
            .iter()
            .map(|k| {
                aws_sdk_s3::types::ObjectIdentifier::builder()
                    .key(k)
                    .build()
                    .expect("valid key")
            })
            .collect();

        let delete = aws_sdk_s3::types::Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;

        self.client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;

        info!("deleted {} objects", keys.len());
        Ok(())
    }

    /// List objects under `prefix`.
    pub async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        debug!("listing objects with prefix: {}", prefix);

        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StorageError::ListFailed(e.to_string()))?;

            if let Some(ref contents) = response.contents {
                for obj in contents {
                    objects.push(ObjectInfo {
                        key: obj.key.clone().unwrap_or_default(),
                        size: obj.size.unwrap_or(0) as u64,
                    });
                }
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(objects)
    }

    /// Check connectivity to the bucket (used by health checks).
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("connectivity check failed: {}", e)))?;
        Ok(())
    }
}

/// Information about a stored object.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
}
