//! S3 storage module
//!
//! The benchmark only needs a narrow slice of the S3 API: bucket lifecycle,
//! paginated listing, batched deletion, presigned URLs for single PUTs and
//! multipart parts, and multipart initiate/complete. [`ObjectStorage`] is that
//! capability; [`S3Client`] implements it with the AWS SDK and
//! [`StorageFacade`] layers the paging and cleanup rules on top.
//!
//! # Tracing
//!
//! | Operation | Span Name | Attributes |
//! |-----------|-----------|------------|
//! | CreateBucket | `s3.create_bucket` | bucket |
//! | ListObjectsV2 | `s3.list_objects` | bucket, keys |
//! | DeleteObjects | `s3.delete_objects` | bucket, keys |
//! | PutObject (presign) | `s3.presign_put_object` | bucket, key |
//! | CreateMultipartUpload | `s3.create_multipart_upload` | bucket, key, upload_id |
//! | UploadPart (presign) | `s3.presign_upload_part` | bucket, upload_id, part_number |
//! | CompleteMultipartUpload | `s3.complete_multipart_upload` | bucket, upload_id, parts_count |
//! | AbortMultipartUpload | `s3.abort_multipart_upload` | bucket, upload_id |

use crate::config::StorageConfig;
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CompletedMultipartUpload, CompletedPart as SdkCompletedPart,
    CreateBucketConfiguration, Delete, ObjectIdentifier,
};
use std::time::Duration;
use thiserror::Error;

pub mod credentials;
pub mod facade;

#[cfg(test)]
pub(crate) mod testing;

pub use credentials::{Credentials, CredentialsError, CredentialsProvider};
pub use facade::{object_key, StorageFacade, MAX_DELETE_BATCH};

/// S3 client errors
#[derive(Error, Debug)]
pub enum S3ClientError {
    /// A response lacked an identifier the benchmark needs to continue
    #[error("Response is missing required field: {0}")]
    MissingSessionField(&'static str),

    /// Backend or network failure, surfaced as reported by the SDK
    #[error("S3 request failed: {0}")]
    Sdk(#[from] aws_sdk_s3::Error),

    #[error("Failed to build S3 request: {0}")]
    Build(#[from] aws_sdk_s3::error::BuildError),

    #[error("Invalid presigning configuration: {0}")]
    Presigning(#[from] aws_sdk_s3::presigning::PresigningConfigError),

    #[error("Failed to delete {failed} object(s), first error: {message}")]
    PartialDelete { failed: usize, message: String },

    #[error("Bucket '{bucket}' still holds {remaining} object(s) after {rounds} cleanup rounds")]
    CleanupStalled {
        bucket: String,
        rounds: usize,
        remaining: usize,
    },

    #[error(transparent)]
    Credentials(#[from] CredentialsError),
}

/// One page of a bucket listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectListing {
    pub keys: Vec<String>,
    /// Present only when the backend reported more results remain
    pub next_continuation_token: Option<String>,
}

/// Completed part info
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPart {
    pub part_number: i32,
    pub etag: String,
}

/// State of one in-flight multipart upload.
///
/// Owned by the iteration that initiated it and dropped after completion or
/// failure; there is no resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub upload_id: String,
    pub key: String,
    pub parts: Vec<CompletedPart>,
}

impl UploadSession {
    pub fn new(upload_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            upload_id: upload_id.into(),
            key: key.into(),
            parts: Vec::new(),
        }
    }
}

/// Object storage capability consumed by the benchmark
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn create_bucket(&self, bucket: &str) -> Result<(), S3ClientError>;

    async fn delete_bucket(&self, bucket: &str) -> Result<(), S3ClientError>;

    /// Fetch one listing page, continuing from `continuation_token` if given
    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectListing, S3ClientError>;

    /// Delete one batch of keys, returning how many were removed
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<usize, S3ClientError>;

    async fn presign_put_object(&self, bucket: &str, key: &str) -> Result<String, S3ClientError>;

    async fn create_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<UploadSession, S3ClientError>;

    async fn presign_upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
    ) -> Result<String, S3ClientError>;

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        session: &UploadSession,
    ) -> Result<(), S3ClientError>;

    /// Discard an upload that will never be completed
    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        session: &UploadSession,
    ) -> Result<(), S3ClientError>;
}

/// S3 client backed by the AWS SDK
pub struct S3Client {
    client: aws_sdk_s3::Client,
    region: String,
    endpoint: String,
    presign_expiry: Duration,
}

impl S3Client {
    /// Create a new S3 client
    ///
    /// Uses path-style addressing so MinIO and other S3-compatible backends
    /// work without wildcard DNS.
    pub async fn new(config: &StorageConfig) -> Result<Self, S3ClientError> {
        let credentials = CredentialsProvider::from_config(config)?;

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials.to_aws())
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
            presign_expiry: Duration::from_secs(config.presign_expiry_secs),
        })
    }

    /// Get the region
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn presigning_config(&self) -> Result<PresigningConfig, S3ClientError> {
        Ok(PresigningConfig::expires_in(self.presign_expiry)?)
    }
}

#[async_trait]
impl ObjectStorage for S3Client {
    #[tracing::instrument(name = "s3.create_bucket", skip(self), fields(s3.bucket = %bucket), err)]
    async fn create_bucket(&self, bucket: &str) -> Result<(), S3ClientError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 rejects an explicit location constraint
        if self.region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        request.send().await.map_err(aws_sdk_s3::Error::from)?;
        tracing::info!(bucket = %bucket, "Created bucket");
        Ok(())
    }

    #[tracing::instrument(name = "s3.delete_bucket", skip(self), fields(s3.bucket = %bucket), err)]
    async fn delete_bucket(&self, bucket: &str) -> Result<(), S3ClientError> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;
        tracing::info!(bucket = %bucket, "Deleted bucket");
        Ok(())
    }

    #[tracing::instrument(
        name = "s3.list_objects",
        skip(self, continuation_token),
        fields(s3.bucket = %bucket, s3.keys = tracing::field::Empty),
        err
    )]
    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectListing, S3ClientError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        let keys: Vec<String> = output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        let next_continuation_token = if output.is_truncated().unwrap_or(false) {
            Some(
                output
                    .next_continuation_token()
                    .ok_or(S3ClientError::MissingSessionField("NextContinuationToken"))?
                    .to_string(),
            )
        } else {
            None
        };

        tracing::Span::current().record("s3.keys", keys.len());

        Ok(ObjectListing {
            keys,
            next_continuation_token,
        })
    }

    #[tracing::instrument(
        name = "s3.delete_objects",
        skip(self, keys),
        fields(s3.bucket = %bucket, s3.keys = keys.len()),
        err
    )]
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<usize, S3ClientError> {
        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()?;

        let delete = Delete::builder().set_objects(Some(objects)).build()?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        let errors = output.errors();
        if let Some(first) = errors.first() {
            return Err(S3ClientError::PartialDelete {
                failed: errors.len(),
                message: format!(
                    "{}: {}",
                    first.key().unwrap_or("<unknown key>"),
                    first.message().unwrap_or("<no message>")
                ),
            });
        }

        Ok(keys.len())
    }

    #[tracing::instrument(
        name = "s3.presign_put_object",
        skip(self),
        fields(s3.bucket = %bucket, s3.key = %key),
        err
    )]
    async fn presign_put_object(&self, bucket: &str, key: &str) -> Result<String, S3ClientError> {
        let presigned = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .presigned(self.presigning_config()?)
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        Ok(presigned.uri().to_string())
    }

    #[tracing::instrument(
        name = "s3.create_multipart_upload",
        skip(self),
        fields(s3.bucket = %bucket, s3.key = %key, s3.upload_id = tracing::field::Empty),
        err
    )]
    async fn create_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<UploadSession, S3ClientError> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        let upload_id = output
            .upload_id()
            .ok_or(S3ClientError::MissingSessionField("UploadId"))?;
        let key = output
            .key()
            .ok_or(S3ClientError::MissingSessionField("Key"))?;

        tracing::Span::current().record("s3.upload_id", upload_id);

        Ok(UploadSession::new(upload_id, key))
    }

    #[tracing::instrument(
        name = "s3.presign_upload_part",
        skip(self, key),
        fields(s3.bucket = %bucket, s3.upload_id = %upload_id, s3.part_number = part_number),
        err
    )]
    async fn presign_upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
    ) -> Result<String, S3ClientError> {
        let presigned = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .presigned(self.presigning_config()?)
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        Ok(presigned.uri().to_string())
    }

    #[tracing::instrument(
        name = "s3.complete_multipart_upload",
        skip(self, session),
        fields(
            s3.bucket = %bucket,
            s3.upload_id = %session.upload_id,
            parts_count = session.parts.len()
        ),
        err
    )]
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        session: &UploadSession,
    ) -> Result<(), S3ClientError> {
        let parts = session
            .parts
            .iter()
            .map(|part| {
                SdkCompletedPart::builder()
                    .part_number(part.part_number)
                    .e_tag(&part.etag)
                    .build()
            })
            .collect();

        self.client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(&session.key)
            .upload_id(&session.upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        Ok(())
    }

    #[tracing::instrument(
        name = "s3.abort_multipart_upload",
        skip(self, session),
        fields(s3.bucket = %bucket, s3.upload_id = %session.upload_id),
        err
    )]
    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        session: &UploadSession,
    ) -> Result<(), S3ClientError> {
        self.client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(&session.key)
            .upload_id(&session.upload_id)
            .send()
            .await
            .map_err(aws_sdk_s3::Error::from)?;

        Ok(())
    }
}
