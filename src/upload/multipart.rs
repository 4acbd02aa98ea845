//! Multipart upload through presigned part URLs
//!
//! One upload is: initiate, then for each part (strictly in order, one at a
//! time) presign the part URL and PUT the bytes, then complete with the
//! ordered completion tags.

use super::{Transport, UploadError};
use crate::s3::{object_key, CompletedPart, StorageFacade};
use bytes::Bytes;
use std::time::Duration;
use tokio::time::Instant;

/// Minimum part size (5MB) - S3 requirement for every part but the last
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum parts allowed
pub const MAX_PARTS: usize = 10000;

/// Split `total` bytes into `chunk`-sized parts plus a trailing remainder part
pub fn part_sizes(total: u64, chunk: u64) -> Vec<u64> {
    if chunk == 0 {
        return Vec::new();
    }
    let full = total / chunk;
    let remaining = total % chunk;

    let mut sizes = vec![chunk; full as usize];
    if remaining > 0 {
        sizes.push(remaining);
    }
    sizes
}

/// Phase durations of one multipart upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultipartTimings {
    /// Time spent presigning and uploading every part
    pub parts: Duration,
    /// Time spent in the complete call
    pub complete: Duration,
    pub part_count: usize,
}

/// Multipart upload driver
pub struct MultipartUploader<'a> {
    storage: &'a StorageFacade,
    transport: &'a dyn Transport,
    strict_etag: bool,
}

impl<'a> MultipartUploader<'a> {
    pub fn new(storage: &'a StorageFacade, transport: &'a dyn Transport) -> Self {
        Self {
            storage,
            transport,
            strict_etag: true,
        }
    }

    /// When false, a part response without an ETag records an empty tag
    /// instead of failing the upload.
    pub fn strict_etag(mut self, strict: bool) -> Self {
        self.strict_etag = strict;
        self
    }

    /// Upload `payload` under a fresh key below `prefix` in `chunk_size` parts
    #[tracing::instrument(
        name = "upload.multipart",
        skip(self, payload),
        fields(
            upload.bytes = payload.len(),
            s3.upload_id = tracing::field::Empty
        ),
        err
    )]
    pub async fn upload(
        &self,
        prefix: &str,
        payload: &Bytes,
        chunk_size: u64,
    ) -> Result<MultipartTimings, UploadError> {
        let sizes = part_sizes(payload.len() as u64, chunk_size);
        if sizes.len() > MAX_PARTS {
            return Err(UploadError::TooManyParts(sizes.len(), MAX_PARTS));
        }

        let mut session = self
            .storage
            .create_multipart_upload(&object_key(prefix))
            .await?;
        tracing::Span::current().record("s3.upload_id", session.upload_id.as_str());

        let parts_start = Instant::now();
        let mut offset = 0usize;
        for (index, size) in sizes.iter().enumerate() {
            let part_number = index as i32 + 1;
            let end = offset + *size as usize;
            let body = payload.slice(offset..end);
            offset = end;

            let url = self
                .storage
                .presign_upload_part(&session, part_number)
                .await?;
            let etag = match self.transport.put(&url, body).await? {
                Some(etag) => etag,
                None if self.strict_etag => return Err(UploadError::MissingEtag(part_number)),
                None => {
                    tracing::warn!(
                        upload_id = %session.upload_id,
                        part_number,
                        "Part response had no ETag, completing with an empty tag"
                    );
                    String::new()
                }
            };

            session.parts.push(CompletedPart { part_number, etag });
        }
        let parts = parts_start.elapsed();

        let complete_start = Instant::now();
        self.storage.complete_multipart_upload(&session).await?;
        let complete = complete_start.elapsed();

        tracing::debug!(
            upload_id = %session.upload_id,
            parts = session.parts.len(),
            parts_ms = parts.as_millis() as u64,
            complete_ms = complete.as_millis() as u64,
            "Completed multipart upload"
        );

        Ok(MultipartTimings {
            parts,
            complete,
            part_count: session.parts.len(),
        })
    }
}
