//! Upload module
//!
//! Moves payload bytes to presigned URLs: a single PUT for whole objects,
//! or a sequential initiate / part / complete flow for multipart uploads.

use crate::s3::S3ClientError;
use thiserror::Error;

pub mod multipart;
pub mod payload;
pub mod put_object;
pub mod transport;

pub use multipart::{part_sizes, MultipartTimings, MultipartUploader, MIN_PART_SIZE};
pub use payload::random_payload;
pub use put_object::SingleUploader;
pub use transport::{HttpTransport, Transport};

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    /// Network failure, surfaced as reported by the HTTP client
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Presigned upload failed with HTTP status {0}")]
    Status(u16),

    #[error("Part {0} upload response carried no ETag header")]
    MissingEtag(i32),

    #[error("Storage error: {0}")]
    Storage(#[from] S3ClientError),

    #[error("Upload needs {0} parts, more than the S3 limit of {1}")]
    TooManyParts(usize, usize),

    #[error("Payload of {0} bytes cannot be allocated on this platform")]
    PayloadTooLarge(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_session_field_converts() {
        let err: UploadError = S3ClientError::MissingSessionField("UploadId").into();
        assert_eq!(
            err.to_string(),
            "Storage error: Response is missing required field: UploadId"
        );
    }
}
