//! What one iteration of each scenario does
//!
//! Uploads opened only to be measured are aborted in teardown so the bucket
//! holds no pending multipart state when it is deleted.

use super::{BenchError, MetricKey, Phases, Workload};
use crate::s3::{object_key, StorageFacade, UploadSession};
use crate::upload::{random_payload, MultipartUploader, SingleUploader, Transport};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Mutex;

/// Presign a PUT URL for a fresh key
pub struct PresignPutWorkload<'a> {
    pub storage: &'a StorageFacade,
    pub prefix: String,
}

#[async_trait]
impl<'a> Workload for PresignPutWorkload<'a> {
    type Fixture = ();

    async fn setup(&self) -> Result<(), BenchError> {
        Ok(())
    }

    async fn iterate(&self, _: &()) -> Result<Phases, BenchError> {
        self.storage
            .presign_put_object(&object_key(&self.prefix))
            .await?;
        Ok(Vec::new())
    }
}

/// Initiate a multipart upload for a fresh key
pub struct InitiateMultipartWorkload<'a> {
    storage: &'a StorageFacade,
    prefix: String,
    opened: Mutex<Vec<UploadSession>>,
}

impl<'a> InitiateMultipartWorkload<'a> {
    pub fn new(storage: &'a StorageFacade, prefix: String) -> Self {
        Self {
            storage,
            prefix,
            opened: Mutex::new(Vec::new()),
        }
    }

    fn take_opened(&self) -> Vec<UploadSession> {
        match self.opened.lock() {
            Ok(mut opened) => std::mem::take(&mut *opened),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl<'a> Workload for InitiateMultipartWorkload<'a> {
    type Fixture = ();

    async fn setup(&self) -> Result<(), BenchError> {
        Ok(())
    }

    async fn iterate(&self, _: &()) -> Result<Phases, BenchError> {
        let session = self
            .storage
            .create_multipart_upload(&object_key(&self.prefix))
            .await?;
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(session);
        }
        Ok(Vec::new())
    }

    async fn teardown(&self, _: ()) -> Result<(), BenchError> {
        let opened = self.take_opened();
        let count = opened.len();
        let mut first_error = None;
        for session in &opened {
            if let Err(e) = self.storage.abort_multipart_upload(session).await {
                first_error.get_or_insert(e);
            }
        }
        tracing::debug!(uploads = count, "Aborted measured uploads");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

/// Presign part 1 of a single upload initiated during setup
pub struct PresignPartWorkload<'a> {
    pub storage: &'a StorageFacade,
    pub prefix: String,
}

#[async_trait]
impl<'a> Workload for PresignPartWorkload<'a> {
    type Fixture = UploadSession;

    async fn setup(&self) -> Result<UploadSession, BenchError> {
        let session = self
            .storage
            .create_multipart_upload(&object_key(&self.prefix))
            .await?;
        Ok(session)
    }

    async fn iterate(&self, session: &UploadSession) -> Result<Phases, BenchError> {
        self.storage.presign_upload_part(session, 1).await?;
        Ok(Vec::new())
    }

    async fn teardown(&self, session: UploadSession) -> Result<(), BenchError> {
        self.storage.abort_multipart_upload(&session).await?;
        Ok(())
    }
}

/// Whole-object upload through one presigned PUT
pub struct SingleUploadWorkload<'a> {
    pub storage: &'a StorageFacade,
    pub transport: &'a dyn Transport,
    pub prefix: String,
    pub size: u64,
}

#[async_trait]
impl<'a> Workload for SingleUploadWorkload<'a> {
    type Fixture = Bytes;

    async fn setup(&self) -> Result<Bytes, BenchError> {
        Ok(random_payload(self.size)?)
    }

    async fn iterate(&self, payload: &Bytes) -> Result<Phases, BenchError> {
        SingleUploader::new(self.storage, self.transport)
            .upload(&self.prefix, payload.clone())
            .await?;
        Ok(Vec::new())
    }
}

/// Full multipart upload, reporting the parts and complete phases
pub struct MultipartUploadWorkload<'a> {
    pub storage: &'a StorageFacade,
    pub transport: &'a dyn Transport,
    pub prefix: String,
    pub size: u64,
    pub chunk: u64,
    pub strict_etag: bool,
}

#[async_trait]
impl<'a> Workload for MultipartUploadWorkload<'a> {
    type Fixture = Bytes;

    async fn setup(&self) -> Result<Bytes, BenchError> {
        Ok(random_payload(self.size)?)
    }

    async fn iterate(&self, payload: &Bytes) -> Result<Phases, BenchError> {
        let timings = MultipartUploader::new(self.storage, self.transport)
            .strict_etag(self.strict_etag)
            .upload(&self.prefix, payload, self.chunk)
            .await?;

        Ok(vec![
            (
                MetricKey::MultipartParts {
                    size: self.size,
                    chunk: self.chunk,
                },
                timings.parts,
            ),
            (
                MetricKey::MultipartComplete {
                    size: self.size,
                    chunk: self.chunk,
                },
                timings.complete,
            ),
        ])
    }
}
