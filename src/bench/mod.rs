//! Benchmark sweep
//!
//! The [`registry`] fixes which scenarios run and in what order, the
//! [`sampler`] measures one scenario under its time budget, [`workloads`]
//! hold what a single iteration does, and [`sweep`] drives it all against one
//! temporary bucket.

pub mod registry;
pub mod sampler;
pub mod sweep;
pub mod workloads;

pub use registry::{MetricKey, Scenario, ScenarioKind, ScenarioRegistry};
pub use sampler::{Phases, SampleSummary, Sampler, Workload, MIN_SAMPLES};
pub use sweep::{bucket_name, Sweep};

use crate::config::ConfigError;
use crate::s3::S3ClientError;
use crate::size::SizeError;
use crate::store::StoreError;
use crate::upload::UploadError;
use thiserror::Error;

/// Anything that aborts a sweep
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Size(#[from] SizeError),

    #[error("Storage error: {0}")]
    Storage(#[from] S3ClientError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Failed to persist measurements: {0}")]
    Store(#[from] StoreError),
}
