//! Single-PUT upload through a presigned URL

use super::{Transport, UploadError};
use crate::s3::{object_key, StorageFacade};
use bytes::Bytes;

/// Uploads a whole object with one presigned PUT
pub struct SingleUploader<'a> {
    storage: &'a StorageFacade,
    transport: &'a dyn Transport,
}

impl<'a> SingleUploader<'a> {
    pub fn new(storage: &'a StorageFacade, transport: &'a dyn Transport) -> Self {
        Self { storage, transport }
    }

    /// Presign a PUT for a fresh key under `prefix` and send `body` to it.
    ///
    /// Returns the object key and the response ETag (empty if absent; a
    /// single PUT never needs it again).
    #[tracing::instrument(
        name = "upload.put_object",
        skip(self, body),
        fields(upload.bytes = body.len(), s3.key = tracing::field::Empty),
        err
    )]
    pub async fn upload(&self, prefix: &str, body: Bytes) -> Result<(String, String), UploadError> {
        let key = object_key(prefix);
        tracing::Span::current().record("s3.key", key.as_str());

        let url = self.storage.presign_put_object(&key).await?;
        let etag = self.transport.put(&url, body).await?.unwrap_or_default();

        tracing::debug!(key = %key, etag = %etag, "PutObject upload completed");
        Ok((key, etag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::s3::testing::FakeStorage;
    use crate::upload::multipart::tests::RecordingTransport;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_single_upload_presigns_and_puts_once() {
        let fake = Arc::new(FakeStorage::new());
        let storage = StorageFacade::new(fake.clone(), "bench");
        let transport = RecordingTransport::with_etags();

        let (key, etag) = SingleUploader::new(&storage, &transport)
            .upload("upload_1m", Bytes::from(vec![7u8; 1024]))
            .await
            .unwrap();

        assert!(key.starts_with("upload_1m/"));
        assert_eq!(etag, "\"etag-1\"");
        assert_eq!(fake.presign_put_calls(), 1);
        assert_eq!(transport.sizes(), vec![1024]);
        assert!(transport.urls()[0].ends_with(&format!("/bench/{}", key)));
    }

    #[tokio::test]
    async fn test_single_upload_tolerates_missing_etag() {
        let fake = Arc::new(FakeStorage::new());
        let storage = StorageFacade::new(fake, "bench");
        let transport = RecordingTransport::without_etags();

        let (_, etag) = SingleUploader::new(&storage, &transport)
            .upload("upload_1m", Bytes::from_static(b"data"))
            .await
            .unwrap();

        assert_eq!(etag, "");
    }
}
