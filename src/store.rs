//! Measurement store
//!
//! Maps a scenario name to the ordered latencies (milliseconds) collected for
//! it. Samples are only ever appended. The whole map is written as a JSON
//! object of `name -> [ms, ...]` after every scenario so a crash mid-sweep
//! keeps everything measured so far.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Store persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access measurement file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid measurement file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Scenario name to ordered millisecond samples
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementStore {
    samples: BTreeMap<String, Vec<u64>>,
}

impl MeasurementStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample to `name`, creating the series if needed
    pub fn record_ms(&mut self, name: &str, millis: u64) {
        match self.samples.get_mut(name) {
            Some(series) => series.push(millis),
            None => {
                self.samples.insert(name.to_string(), vec![millis]);
            }
        }
    }

    /// Append an elapsed duration, truncated to whole milliseconds
    pub fn record(&mut self, name: &str, elapsed: Duration) {
        self.record_ms(name, elapsed.as_millis() as u64);
    }

    /// Make sure `name` exists even if it never receives a sample
    pub fn ensure(&mut self, name: &str) {
        self.samples.entry(name.to_string()).or_default();
    }

    /// Samples recorded for `name`, in insertion order
    pub fn samples(&self, name: &str) -> Option<&[u64]> {
        self.samples.get(name).map(Vec::as_slice)
    }

    /// Number of scenario series
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterate `(name, samples)` pairs ordered by name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u64])> {
        self.samples.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Write the full store to `path`.
    ///
    /// The file is written to a sibling temp path and renamed into place so a
    /// crash never leaves a truncated artifact behind.
    pub fn persist<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");

        let mut file = std::fs::File::create(&tmp)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        std::fs::rename(&tmp, path)?;

        tracing::debug!(path = %path.display(), scenarios = self.len(), "Persisted measurements");
        Ok(())
    }

    /// Read a store previously written by [`MeasurementStore::persist`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
