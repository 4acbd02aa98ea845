//! Benchmark payload generation

use super::UploadError;
use bytes::Bytes;
use rand::RngCore;

/// Random bytes of the requested size.
///
/// Generated once per scenario; multipart parts are zero-copy slices of it.
pub fn random_payload(size: u64) -> Result<Bytes, UploadError> {
    let len = usize::try_from(size).map_err(|_| UploadError::PayloadTooLarge(size))?;
    let mut data = vec![0u8; len];
    rand::rng().fill_bytes(&mut data);
    Ok(Bytes::from(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_has_requested_size() {
        assert_eq!(random_payload(0).unwrap().len(), 0);
        assert_eq!(random_payload(4096).unwrap().len(), 4096);
    }

    #[test]
    fn test_payload_is_not_constant() {
        let payload = random_payload(1024).unwrap();
        assert!(payload.iter().any(|&b| b != payload[0]));
    }
}
