//! Configuration module for the upload benchmark
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion, environment-only configuration with
//! MinIO-friendly defaults, and validation of the sweep plan.

use crate::size::{parse_size, SizeError};
use crate::upload::multipart::MAX_PARTS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Environment variable overriding `storage.endpoint`
pub const ENV_ENDPOINT: &str = "S3_ENDPOINT";
/// Environment variable overriding `storage.region`
pub const ENV_REGION: &str = "S3_REGION";
/// Environment variable overriding `storage.access_key`
pub const ENV_ACCESS_KEY: &str = "S3_ACCESS_KEY";
/// Environment variable overriding `storage.secret_key`
pub const ENV_SECRET_KEY: &str = "S3_SECRET_KEY";
/// Environment variable overriding `storage.bucket_prefix`
pub const ENV_BUCKET_PREFIX: &str = "S3_BUCKET_PREFIX";

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
pub(crate) fn expand_env_vars(s: &str, re: &regex_lite::Regex) -> String {
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);
    result
}

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Size(#[from] SizeError),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Build configuration from defaults and `S3_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.storage.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Every size string is parsed here so a malformed size aborts the run
    /// before any storage call is made.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_http_url(&self.storage.endpoint) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid endpoint '{}': must start with http:// or https://",
                self.storage.endpoint
            )));
        }

        if self.storage.bucket_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "bucket_prefix cannot be empty".into(),
            ));
        }

        let sweep = &self.sweep;
        for size in sweep
            .traditional_sizes
            .iter()
            .chain(&sweep.multipart_small_sizes)
            .chain(&sweep.multipart_small_chunks)
            .chain(&sweep.multipart_large_sizes)
            .chain(&sweep.multipart_large_chunks)
            .chain(std::iter::once(&sweep.large_size_threshold))
            .chain(std::iter::once(&self.report.small_size_cutoff))
        {
            let bytes = parse_size(size)?;
            if bytes == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "Size '{}' must be greater than zero",
                    size
                )));
            }
        }

        if !sweep.multipart_small_sizes.is_empty() && sweep.multipart_small_chunks.is_empty() {
            return Err(ConfigError::ValidationError(
                "multipart_small_sizes requires at least one multipart_small_chunks entry".into(),
            ));
        }

        if !sweep.multipart_large_sizes.is_empty() && sweep.multipart_large_chunks.is_empty() {
            return Err(ConfigError::ValidationError(
                "multipart_large_sizes requires at least one multipart_large_chunks entry".into(),
            ));
        }

        let pairs = [
            (&sweep.multipart_small_sizes, &sweep.multipart_small_chunks),
            (&sweep.multipart_large_sizes, &sweep.multipart_large_chunks),
        ];
        for (sizes, chunks) in pairs {
            for size in sizes {
                for chunk in chunks {
                    let parts = parse_size(size)?.div_ceil(parse_size(chunk)?);
                    if parts > MAX_PARTS as u64 {
                        return Err(ConfigError::ValidationError(format!(
                            "Multipart upload of {} in {} chunks needs {} parts (limit {})",
                            size, chunk, parts, MAX_PARTS
                        )));
                    }
                }
            }
        }

        if sweep.min_samples == 0 {
            return Err(ConfigError::ValidationError(
                "min_samples must be at least 1".into(),
            ));
        }

        if sweep.max_cleanup_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "max_cleanup_rounds must be at least 1".into(),
            ));
        }

        if sweep.large_budget_multiplier == 0 {
            return Err(ConfigError::ValidationError(
                "large_budget_multiplier must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

/// S3-compatible storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_access_key")]
    pub access_key: String,
    #[serde(default = "default_secret_key")]
    pub secret_key: String,
    /// Prefix of the per-run bucket name; a timestamp is appended
    #[serde(default = "default_bucket_prefix")]
    pub bucket_prefix: String,
    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u64,
}

impl StorageConfig {
    fn apply_env(&mut self) {
        let overrides: [(&str, &mut String); 5] = [
            (ENV_ENDPOINT, &mut self.endpoint),
            (ENV_REGION, &mut self.region),
            (ENV_ACCESS_KEY, &mut self.access_key),
            (ENV_SECRET_KEY, &mut self.secret_key),
            (ENV_BUCKET_PREFIX, &mut self.bucket_prefix),
        ];
        for (var, field) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    *field = value;
                }
            }
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            region: default_region(),
            access_key: default_access_key(),
            secret_key: default_secret_key(),
            bucket_prefix: default_bucket_prefix(),
            presign_expiry_secs: default_presign_expiry_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:9000".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_access_key() -> String {
    "minioadmin".to_string()
}

fn default_secret_key() -> String {
    "minioadmin".to_string()
}

fn default_bucket_prefix() -> String {
    "upload-bench".to_string()
}

fn default_presign_expiry_secs() -> u64 {
    3600
}

/// Sweep plan and sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_traditional_sizes")]
    pub traditional_sizes: Vec<String>,
    #[serde(default = "default_multipart_small_sizes")]
    pub multipart_small_sizes: Vec<String>,
    #[serde(default = "default_multipart_small_chunks")]
    pub multipart_small_chunks: Vec<String>,
    #[serde(default = "default_multipart_large_sizes")]
    pub multipart_large_sizes: Vec<String>,
    #[serde(default = "default_multipart_large_chunks")]
    pub multipart_large_chunks: Vec<String>,
    /// Transfers at or above this size get the extended time budget
    #[serde(default = "default_large_size_threshold")]
    pub large_size_threshold: String,
    #[serde(default = "default_budget_ms")]
    pub default_budget_ms: u64,
    #[serde(default = "default_large_budget_multiplier")]
    pub large_budget_multiplier: u32,
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    #[serde(default = "default_results_path")]
    pub results_path: PathBuf,
    /// Fail a part upload whose response carries no ETag header
    #[serde(default = "default_strict_etag")]
    pub strict_etag: bool,
    #[serde(default = "default_max_cleanup_rounds")]
    pub max_cleanup_rounds: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            traditional_sizes: default_traditional_sizes(),
            multipart_small_sizes: default_multipart_small_sizes(),
            multipart_small_chunks: default_multipart_small_chunks(),
            multipart_large_sizes: default_multipart_large_sizes(),
            multipart_large_chunks: default_multipart_large_chunks(),
            large_size_threshold: default_large_size_threshold(),
            default_budget_ms: default_budget_ms(),
            large_budget_multiplier: default_large_budget_multiplier(),
            min_samples: default_min_samples(),
            results_path: default_results_path(),
            strict_etag: default_strict_etag(),
            max_cleanup_rounds: default_max_cleanup_rounds(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_traditional_sizes() -> Vec<String> {
    strings(&["512k", "1m", "5m", "10m", "50m", "100m", "500m", "1g"])
}

fn default_multipart_small_sizes() -> Vec<String> {
    strings(&["5m", "10m", "50m", "100m"])
}

fn default_multipart_small_chunks() -> Vec<String> {
    strings(&["5m", "10m"])
}

fn default_multipart_large_sizes() -> Vec<String> {
    strings(&["500m", "1g"])
}

fn default_multipart_large_chunks() -> Vec<String> {
    strings(&["50m", "100m"])
}

fn default_large_size_threshold() -> String {
    "500m".to_string()
}

fn default_budget_ms() -> u64 {
    10_000
}

fn default_large_budget_multiplier() -> u32 {
    5
}

fn default_min_samples() -> usize {
    3
}

fn default_results_path() -> PathBuf {
    PathBuf::from("results.json")
}

fn default_strict_etag() -> bool {
    true
}

fn default_max_cleanup_rounds() -> usize {
    100
}

/// Report generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Largest size shown in the "small sizes only" comparison chart
    #[serde(default = "default_small_size_cutoff")]
    pub small_size_cutoff: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            small_size_cutoff: default_small_size_cutoff(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("report")
}

fn default_small_size_cutoff() -> String {
    "100m".to_string()
}
