//! S3 Upload Bench - report generator
//!
//! Reads a results file written by `s3-upload-bench` and writes markdown
//! tables and SVG charts. Needs no storage access.

use clap::Parser;
use s3_upload_bench::report::{generate_from_file, Reporter, SvgRenderer};
use s3_upload_bench::{logging, Config};
use std::path::PathBuf;
use tracing::info;

/// Render tables and charts from benchmark results
#[derive(Parser, Debug)]
#[command(name = "s3-upload-report")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Results file produced by a sweep
    results: PathBuf,

    /// Configuration used for the sweep; defaults apply without it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory (overrides report.output_dir)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::init_subscriber(&args.log_level, false)?;

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut reporter = Reporter::new(&config, SvgRenderer::default())?;
    if let Some(dir) = &args.output_dir {
        reporter = reporter.with_output_dir(dir);
    }

    let written = generate_from_file(&reporter, &args.results)?;
    info!(
        files = written.len(),
        output_dir = %reporter.output_dir().display(),
        "Reports written"
    );

    Ok(())
}
