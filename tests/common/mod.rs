//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use s3_upload_bench::s3::{ObjectListing, ObjectStorage, S3ClientError, UploadSession};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    buckets: BTreeMap<String, BTreeSet<String>>,
    next_upload: u64,
    completed: Vec<UploadSession>,
    aborted: usize,
}

/// In-memory storage whose presigned URLs point at `base_url`
///
/// Pair it with a wiremock server to drive the real HTTP transport.
pub struct PresignedStorage {
    base_url: String,
    state: Mutex<State>,
}

impl PresignedStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn completed(&self) -> Vec<UploadSession> {
        self.state.lock().unwrap().completed.clone()
    }

    pub fn aborted(&self) -> usize {
        self.state.lock().unwrap().aborted
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.state.lock().unwrap().buckets.contains_key(bucket)
    }

    fn add_object(&self, bucket: &str, key: &str) {
        self.state
            .lock()
            .unwrap()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string());
    }
}

#[async_trait]
impl ObjectStorage for PresignedStorage {
    async fn create_bucket(&self, bucket: &str) -> Result<(), S3ClientError> {
        self.state
            .lock()
            .unwrap()
            .buckets
            .insert(bucket.to_string(), BTreeSet::new());
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), S3ClientError> {
        self.state.lock().unwrap().buckets.remove(bucket);
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        _continuation_token: Option<String>,
    ) -> Result<ObjectListing, S3ClientError> {
        let state = self.state.lock().unwrap();
        Ok(ObjectListing {
            keys: state
                .buckets
                .get(bucket)
                .map(|keys| keys.iter().cloned().collect())
                .unwrap_or_default(),
            next_continuation_token: None,
        })
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<usize, S3ClientError> {
        let mut state = self.state.lock().unwrap();
        let Some(objects) = state.buckets.get_mut(bucket) else {
            return Ok(0);
        };
        Ok(keys.iter().filter(|key| objects.remove(*key)).count())
    }

    async fn presign_put_object(&self, bucket: &str, key: &str) -> Result<String, S3ClientError> {
        self.add_object(bucket, key);
        Ok(format!("{}/{}/{}", self.base_url, bucket, key))
    }

    async fn create_multipart_upload(
        &self,
        _bucket: &str,
        key: &str,
    ) -> Result<UploadSession, S3ClientError> {
        let mut state = self.state.lock().unwrap();
        state.next_upload += 1;
        Ok(UploadSession::new(format!("upload-{}", state.next_upload), key))
    }

    async fn presign_upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
    ) -> Result<String, S3ClientError> {
        Ok(format!(
            "{}/{}/{}?partNumber={}&uploadId={}",
            self.base_url, bucket, key, part_number, upload_id
        ))
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        session: &UploadSession,
    ) -> Result<(), S3ClientError> {
        self.add_object(bucket, &session.key);
        self.state.lock().unwrap().completed.push(session.clone());
        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        _bucket: &str,
        _session: &UploadSession,
    ) -> Result<(), S3ClientError> {
        self.state.lock().unwrap().aborted += 1;
        Ok(())
    }
}
