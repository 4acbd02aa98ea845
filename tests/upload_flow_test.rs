//! Upload Flow Integration Tests
//!
//! Drives the real reqwest transport against a mock HTTP server standing in
//! for presigned URL targets.

mod common;

#[cfg(test)]
mod tests {
    use super::common::PresignedStorage;
    use bytes::Bytes;
    use s3_upload_bench::s3::{CompletedPart, StorageFacade};
    use s3_upload_bench::upload::{
        HttpTransport, MultipartUploader, SingleUploader, Transport, UploadError,
    };
    use std::sync::Arc;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MIB: usize = 1024 * 1024;

    #[tokio::test]
    async fn test_put_returns_etag_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/bench/object"))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"abc123\""))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let etag = transport
            .put(
                &format!("{}/bench/object", mock_server.uri()),
                Bytes::from("test data"),
            )
            .await
            .unwrap();

        assert_eq!(etag.as_deref(), Some("\"abc123\""));
    }

    #[tokio::test]
    async fn test_put_without_etag_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let etag = transport
            .put(&format!("{}/bench/object", mock_server.uri()), Bytes::new())
            .await
            .unwrap();

        assert!(etag.is_none());
    }

    #[tokio::test]
    async fn test_put_error_status_fails() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        let transport = HttpTransport::new().unwrap();
        let result = transport
            .put(
                &format!("{}/bench/object", mock_server.uri()),
                Bytes::from("x"),
            )
            .await;

        assert!(matches!(result, Err(UploadError::Status(403))));
    }

    #[tokio::test]
    async fn test_single_upload_sends_whole_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path_regex(r"^/bench/upload_1m/\d+$"))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"single\""))
            .expect(1)
            .mount(&mock_server)
            .await;

        let storage = StorageFacade::new(Arc::new(PresignedStorage::new(mock_server.uri())), "bench");
        let transport = HttpTransport::new().unwrap();

        let (key, etag) = SingleUploader::new(&storage, &transport)
            .upload("upload_1m", Bytes::from(vec![1u8; MIB]))
            .await
            .unwrap();

        assert!(key.starts_with("upload_1m/"));
        assert_eq!(etag, "\"single\"");

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests[0].body.len(), MIB);
    }

    #[tokio::test]
    async fn test_multipart_ten_megabytes_in_five_megabyte_parts() {
        let mock_server = MockServer::start().await;

        for part in ["1", "2"] {
            Mock::given(method("PUT"))
                .and(query_param("partNumber", part))
                .respond_with(
                    ResponseTemplate::new(200).insert_header("ETag", format!("\"etag-{}\"", part)),
                )
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let backend = Arc::new(PresignedStorage::new(mock_server.uri()));
        let storage = StorageFacade::new(backend.clone(), "bench");
        let transport = HttpTransport::new().unwrap();
        let payload = Bytes::from(vec![0u8; 10 * MIB]);

        let timings = MultipartUploader::new(&storage, &transport)
            .upload("multipart_10m_5m", &payload, 5 * MIB as u64)
            .await
            .unwrap();

        assert_eq!(timings.part_count, 2);

        let completed = backend.completed();
        assert_eq!(completed.len(), 1);
        assert_eq!(
            completed[0].parts,
            vec![
                CompletedPart {
                    part_number: 1,
                    etag: "\"etag-1\"".to_string()
                },
                CompletedPart {
                    part_number: 2,
                    etag: "\"etag-2\"".to_string()
                },
            ]
        );

        let requests = mock_server.received_requests().await.unwrap();
        assert!(requests.iter().all(|r| r.body.len() == 5 * MIB));
    }

    #[tokio::test]
    async fn test_multipart_single_chunk() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(query_param("partNumber", "1"))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"only\""))
            .expect(1)
            .mount(&mock_server)
            .await;

        let backend = Arc::new(PresignedStorage::new(mock_server.uri()));
        let storage = StorageFacade::new(backend.clone(), "bench");
        let transport = HttpTransport::new().unwrap();

        MultipartUploader::new(&storage, &transport)
            .upload("multipart_5m_5m", &Bytes::from(vec![0u8; 5 * MIB]), 5 * MIB as u64)
            .await
            .unwrap();

        assert_eq!(backend.completed()[0].parts.len(), 1);
    }

    #[tokio::test]
    async fn test_multipart_missing_etag_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let backend = Arc::new(PresignedStorage::new(mock_server.uri()));
        let storage = StorageFacade::new(backend.clone(), "bench");
        let transport = HttpTransport::new().unwrap();

        let result = MultipartUploader::new(&storage, &transport)
            .upload("multipart_2k_1k", &Bytes::from(vec![0u8; 2048]), 1024)
            .await;

        assert!(matches!(result, Err(UploadError::MissingEtag(1))));
        assert!(backend.completed().is_empty());
    }
}
