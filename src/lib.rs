//! S3 Upload Bench Library
//!
//! Measures how long it takes to get bytes into S3-compatible storage through
//! presigned URLs, comparing one PUT per object against multipart uploads at
//! several chunk sizes, and turns the raw samples into tables and charts.
//!
//! # Features
//!
//! - **Time-budgeted sampling**: every scenario runs at least three times and
//!   keeps going until its budget is spent
//! - **Crash-tolerant results**: measurements are persisted after every scenario
//! - **Self-cleaning**: one temporary bucket per run, emptied between scenarios
//! - **Offline reports**: markdown tables and SVG charts from a results file
//!
//! # Example
//!
//! ```no_run
//! use s3_upload_bench::bench::{bucket_name, Sweep};
//! use s3_upload_bench::s3::{S3Client, StorageFacade};
//! use s3_upload_bench::upload::HttpTransport;
//! use s3_upload_bench::Config;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = S3Client::new(&config.storage).await?;
//!     let storage = StorageFacade::new(Arc::new(client), bucket_name(&config.storage.bucket_prefix));
//!     let sweep = Sweep::new(storage, Arc::new(HttpTransport::new()?), &config.sweep)?;
//!     sweep.run().await?;
//!     Ok(())
//! }
//! ```

pub mod bench;
pub mod config;
pub mod logging;
pub mod report;
pub mod s3;
pub mod size;
pub mod store;
pub mod upload;

// Re-export commonly used types
pub use config::Config;
pub use store::MeasurementStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
