//! Storage facade
//!
//! Binds an [`ObjectStorage`] backend to the single bucket a sweep owns and
//! adds the behaviour the raw capability leaves to callers: listing through
//! every page, batching deletes, emptying the bucket before removing it, and
//! generating collision-free object keys.

use super::{ObjectStorage, S3ClientError, UploadSession};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Largest key batch accepted by a single DeleteObjects call
pub const MAX_DELETE_BATCH: usize = 1000;

const DEFAULT_MAX_CLEANUP_ROUNDS: usize = 100;

static LAST_KEY_SUFFIX: AtomicU64 = AtomicU64::new(0);

/// Wall-clock nanoseconds, bumped so every call returns a strictly larger value
fn monotonic_suffix() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);

    let mut prev = LAST_KEY_SUFFIX.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST_KEY_SUFFIX.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

/// Build an object key `{prefix}/{suffix}` that never repeats within the process
pub fn object_key(prefix: &str) -> String {
    format!("{}/{}", prefix, monotonic_suffix())
}

/// Storage operations scoped to one bucket
#[derive(Clone)]
pub struct StorageFacade {
    backend: Arc<dyn ObjectStorage>,
    bucket: String,
    max_cleanup_rounds: usize,
}

impl StorageFacade {
    pub fn new(backend: Arc<dyn ObjectStorage>, bucket: impl Into<String>) -> Self {
        Self {
            backend,
            bucket: bucket.into(),
            max_cleanup_rounds: DEFAULT_MAX_CLEANUP_ROUNDS,
        }
    }

    /// Bound the list/delete rounds [`StorageFacade::empty_bucket`] may take
    pub fn with_max_cleanup_rounds(mut self, rounds: usize) -> Self {
        self.max_cleanup_rounds = rounds.max(1);
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub async fn create_bucket(&self) -> Result<(), S3ClientError> {
        self.backend.create_bucket(&self.bucket).await
    }

    /// Empty the bucket, then delete it
    pub async fn delete_bucket(&self) -> Result<(), S3ClientError> {
        self.empty_bucket().await?;
        self.backend.delete_bucket(&self.bucket).await
    }

    /// List every key in the bucket, following continuation tokens
    pub async fn list_all_objects(&self) -> Result<Vec<String>, S3ClientError> {
        let mut keys = Vec::new();
        let mut token = None;

        loop {
            let page = self.backend.list_objects(&self.bucket, token).await?;
            keys.extend(page.keys);
            match page.next_continuation_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(keys)
    }

    /// Delete `keys` in batches of at most [`MAX_DELETE_BATCH`].
    ///
    /// An empty slice is a no-op and never reaches the backend.
    pub async fn delete_objects(&self, keys: &[String]) -> Result<usize, S3ClientError> {
        let mut deleted = 0;
        for batch in keys.chunks(MAX_DELETE_BATCH) {
            deleted += self.backend.delete_objects(&self.bucket, batch).await?;
        }
        Ok(deleted)
    }

    /// Delete objects until a listing comes back empty.
    ///
    /// Fails with [`S3ClientError::CleanupStalled`] if the bucket still holds
    /// objects after `max_cleanup_rounds` delete passes.
    pub async fn empty_bucket(&self) -> Result<usize, S3ClientError> {
        let mut total = 0;

        for round in 0..self.max_cleanup_rounds {
            let keys = self.list_all_objects().await?;
            if keys.is_empty() {
                tracing::debug!(bucket = %self.bucket, deleted = total, rounds = round, "Bucket empty");
                return Ok(total);
            }
            total += self.delete_objects(&keys).await?;
        }

        let remaining = self.list_all_objects().await?.len();
        if remaining == 0 {
            return Ok(total);
        }

        Err(S3ClientError::CleanupStalled {
            bucket: self.bucket.clone(),
            rounds: self.max_cleanup_rounds,
            remaining,
        })
    }

    pub async fn presign_put_object(&self, key: &str) -> Result<String, S3ClientError> {
        self.backend.presign_put_object(&self.bucket, key).await
    }

    pub async fn create_multipart_upload(&self, key: &str) -> Result<UploadSession, S3ClientError> {
        self.backend.create_multipart_upload(&self.bucket, key).await
    }

    pub async fn presign_upload_part(
        &self,
        session: &UploadSession,
        part_number: i32,
    ) -> Result<String, S3ClientError> {
        self.backend
            .presign_upload_part(&self.bucket, &session.key, &session.upload_id, part_number)
            .await
    }

    pub async fn complete_multipart_upload(
        &self,
        session: &UploadSession,
    ) -> Result<(), S3ClientError> {
        self.backend
            .complete_multipart_upload(&self.bucket, session)
            .await
    }

    pub async fn abort_multipart_upload(&self, session: &UploadSession) -> Result<(), S3ClientError> {
        self.backend
            .abort_multipart_upload(&self.bucket, session)
            .await
    }
}
