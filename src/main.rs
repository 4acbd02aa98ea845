//! S3 Upload Bench - upload strategy sweep
//!
//! Runs every configured scenario against one temporary bucket and writes the
//! raw samples to a JSON results file.

use clap::Parser;
use s3_upload_bench::bench::{bucket_name, Sweep};
use s3_upload_bench::s3::{S3Client, StorageFacade};
use s3_upload_bench::upload::HttpTransport;
use s3_upload_bench::{logging, Config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Benchmark single-PUT and multipart uploads through presigned URLs
#[derive(Parser, Debug)]
#[command(name = "s3-upload-bench")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file; without it, defaults and S3_* variables are used
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write measurements (overrides sweep.results_path)
    #[arg(short, long)]
    results: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Hide the per-scenario spinner
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::init_subscriber(&args.log_level, args.json_logs)?;

    info!("Starting S3 Upload Bench v{}", s3_upload_bench::VERSION);

    let config = match &args.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::from_env()?,
    };

    let client = S3Client::new(&config.storage).await?;
    info!(
        endpoint = client.endpoint(),
        region = client.region(),
        "Connected storage client"
    );

    let storage = StorageFacade::new(
        Arc::new(client),
        bucket_name(&config.storage.bucket_prefix),
    );
    let transport = Arc::new(HttpTransport::new()?);

    let mut sweep =
        Sweep::new(storage, transport, &config.sweep)?.with_progress(!args.no_progress);
    if let Some(results) = &args.results {
        sweep = sweep.with_results_path(results);
    }

    let store = sweep.run().await?;
    info!(series = store.len(), "Done");

    Ok(())
}
