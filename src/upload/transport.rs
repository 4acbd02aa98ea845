//! HTTP transport for presigned URLs
//!
//! The only thing the benchmark reads back from a presigned PUT is the
//! `ETag` response header, which becomes a part's completion tag.

use super::UploadError;
use async_trait::async_trait;
use bytes::Bytes;

/// PUT capability used for presigned uploads
#[async_trait]
pub trait Transport: Send + Sync {
    /// PUT `body` to `url` and return the response `ETag`, if any
    async fn put(&self, url: &str, body: Bytes) -> Result<Option<String>, UploadError>;
}

/// reqwest-backed transport
///
/// No request timeout is set; a hung upload stalls the sweep rather than
/// producing a truncated measurement.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, UploadError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(
        name = "http.put",
        skip(self, url, body),
        fields(http.method = "PUT", upload.bytes = body.len(), http.status_code = tracing::field::Empty),
        err
    )]
    async fn put(&self, url: &str, body: Bytes) -> Result<Option<String>, UploadError> {
        let response = self.client.put(url).body(body).send().await?;

        let status = response.status();
        tracing::Span::current().record("http.status_code", status.as_u16());
        if !status.is_success() {
            return Err(UploadError::Status(status.as_u16()));
        }

        let etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Ok(etag)
    }
}
