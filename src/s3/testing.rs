//! In-memory [`ObjectStorage`] used by unit tests

use super::{ObjectListing, ObjectStorage, S3ClientError, UploadSession};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

#[derive(Default)]
struct State {
    buckets: BTreeMap<String, BTreeSet<String>>,
    list_calls: usize,
    delete_calls: usize,
    presign_put_calls: usize,
    presign_part_calls: Vec<i32>,
    initiated: usize,
    completed: Vec<UploadSession>,
    aborted: Vec<String>,
}

/// Fake backend with configurable page size and partial deletes
pub(crate) struct FakeStorage {
    state: Mutex<State>,
    page_size: usize,
    delete_limit: Option<usize>,
    base_url: String,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: 1000,
            delete_limit: None,
            base_url: "http://fake.invalid".to_string(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Remove at most `limit` keys per delete call
    pub fn with_delete_limit(mut self, limit: usize) -> Self {
        self.delete_limit = Some(limit);
        self
    }

    pub fn seed(&self, bucket: &str, keys: impl IntoIterator<Item = String>) {
        let mut state = self.state.lock().unwrap();
        state
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .extend(keys);
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.state.lock().unwrap().delete_calls
    }

    pub fn presign_put_calls(&self) -> usize {
        self.state.lock().unwrap().presign_put_calls
    }

    pub fn presign_part_calls(&self) -> Vec<i32> {
        self.state.lock().unwrap().presign_part_calls.clone()
    }

    pub fn initiated(&self) -> usize {
        self.state.lock().unwrap().initiated
    }

    pub fn completed(&self) -> Vec<UploadSession> {
        self.state.lock().unwrap().completed.clone()
    }

    /// Upload ids passed to abort, in call order
    pub fn aborted(&self) -> Vec<String> {
        self.state.lock().unwrap().aborted.clone()
    }

    pub fn object_count(&self, bucket: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .buckets
            .get(bucket)
            .map_or(0, BTreeSet::len)
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.state.lock().unwrap().buckets.contains_key(bucket)
    }

    fn add_object(&self, bucket: &str, key: &str) {
        self.seed(bucket, [key.to_string()]);
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn create_bucket(&self, bucket: &str) -> Result<(), S3ClientError> {
        self.state
            .lock()
            .unwrap()
            .buckets
            .entry(bucket.to_string())
            .or_default();
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), S3ClientError> {
        self.state.lock().unwrap().buckets.remove(bucket);
        Ok(())
    }

    async fn list_objects(
        &self,
        bucket: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectListing, S3ClientError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;

        let offset: usize = continuation_token
            .map(|t| t.parse().unwrap_or(0))
            .unwrap_or(0);
        let all: Vec<String> = state
            .buckets
            .get(bucket)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default();

        let end = (offset + self.page_size).min(all.len());
        let keys = all[offset.min(end)..end].to_vec();
        let next_continuation_token = (end < all.len()).then(|| end.to_string());

        Ok(ObjectListing {
            keys,
            next_continuation_token,
        })
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<usize, S3ClientError> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls += 1;

        let limit = self.delete_limit.unwrap_or(keys.len());
        let mut deleted = 0;
        if let Some(objects) = state.buckets.get_mut(bucket) {
            for key in keys.iter().take(limit) {
                if objects.remove(key) {
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }

    async fn presign_put_object(&self, bucket: &str, key: &str) -> Result<String, S3ClientError> {
        self.state.lock().unwrap().presign_put_calls += 1;
        self.add_object(bucket, key);
        Ok(format!("{}/{}/{}", self.base_url, bucket, key))
    }

    async fn create_multipart_upload(
        &self,
        _bucket: &str,
        key: &str,
    ) -> Result<UploadSession, S3ClientError> {
        let mut state = self.state.lock().unwrap();
        state.initiated += 1;
        Ok(UploadSession::new(format!("upload-{}", state.initiated), key))
    }

    async fn presign_upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
    ) -> Result<String, S3ClientError> {
        self.state
            .lock()
            .unwrap()
            .presign_part_calls
            .push(part_number);
        Ok(format!(
            "{}/{}/{}?uploadId={}&partNumber={}",
            self.base_url, bucket, key, upload_id, part_number
        ))
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        session: &UploadSession,
    ) -> Result<(), S3ClientError> {
        self.state.lock().unwrap().completed.push(session.clone());
        self.add_object(bucket, &session.key);
        Ok(())
    }

    async fn abort_multipart_upload(
        &self,
        _bucket: &str,
        session: &UploadSession,
    ) -> Result<(), S3ClientError> {
        self.state
            .lock()
            .unwrap()
            .aborted
            .push(session.upload_id.clone());
        Ok(())
    }
}
