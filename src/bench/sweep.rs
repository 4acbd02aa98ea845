//! Sweep driver
//!
//! Creates one timestamped bucket, runs every scenario in registry order and
//! flushes after each: summary line, persisted measurements, emptied bucket.
//! The first failure aborts the run; whatever was flushed before it is
//! already on disk.

use super::workloads::{
    InitiateMultipartWorkload, MultipartUploadWorkload, PresignPartWorkload, PresignPutWorkload,
    SingleUploadWorkload,
};
use super::{BenchError, SampleSummary, Sampler, Scenario, ScenarioKind, ScenarioRegistry};
use crate::config::SweepConfig;
use crate::s3::StorageFacade;
use crate::store::MeasurementStore;
use crate::upload::Transport;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// `{prefix}-{UTC timestamp}`, valid as an S3 bucket name for a valid prefix
pub fn bucket_name(prefix: &str) -> String {
    format!(
        "{}-{}",
        prefix.to_lowercase(),
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    )
}

pub struct Sweep {
    storage: StorageFacade,
    transport: Arc<dyn Transport>,
    registry: ScenarioRegistry,
    sampler: Sampler,
    results_path: PathBuf,
    strict_etag: bool,
}

impl Sweep {
    pub fn new(
        storage: StorageFacade,
        transport: Arc<dyn Transport>,
        config: &SweepConfig,
    ) -> Result<Self, BenchError> {
        Ok(Self {
            storage: storage.with_max_cleanup_rounds(config.max_cleanup_rounds),
            transport,
            registry: ScenarioRegistry::from_config(config)?,
            sampler: Sampler::new(config.min_samples),
            results_path: config.results_path.clone(),
            strict_etag: config.strict_etag,
        })
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.sampler = self.sampler.with_progress(progress);
        self
    }

    /// Override where measurements are written
    pub fn with_results_path(mut self, path: impl AsRef<Path>) -> Self {
        self.results_path = path.as_ref().to_path_buf();
        self
    }

    pub fn registry(&self) -> &ScenarioRegistry {
        &self.registry
    }

    /// Run every scenario and return the final measurements
    #[tracing::instrument(name = "bench.sweep", skip(self), fields(bucket = %self.storage.bucket()), err)]
    pub async fn run(&self) -> Result<MeasurementStore, BenchError> {
        let scenarios = self.registry.scenarios();
        tracing::info!(scenarios = scenarios.len(), "Starting sweep");

        self.storage.create_bucket().await?;

        let mut store = MeasurementStore::new();
        for scenario in &scenarios {
            let summary = self.run_scenario(scenario, &mut store).await?;
            self.flush(&summary, &store).await?;
        }

        self.storage.delete_bucket().await?;
        store.persist(&self.results_path)?;

        tracing::info!(
            path = %self.results_path.display(),
            series = store.len(),
            "Sweep finished"
        );
        Ok(store)
    }

    async fn run_scenario(
        &self,
        scenario: &Scenario,
        store: &mut MeasurementStore,
    ) -> Result<SampleSummary, BenchError> {
        let storage = &self.storage;
        let transport = self.transport.as_ref();
        let prefix = scenario.prefix();

        match scenario.kind {
            ScenarioKind::PresignPut => {
                let workload = PresignPutWorkload { storage, prefix };
                self.sampler.run(scenario, &workload, store).await
            }
            ScenarioKind::InitiateMultipart => {
                let workload = InitiateMultipartWorkload::new(storage, prefix);
                self.sampler.run(scenario, &workload, store).await
            }
            ScenarioKind::PresignPart => {
                let workload = PresignPartWorkload { storage, prefix };
                self.sampler.run(scenario, &workload, store).await
            }
            ScenarioKind::SingleUpload { size } => {
                let workload = SingleUploadWorkload {
                    storage,
                    transport,
                    prefix,
                    size,
                };
                self.sampler.run(scenario, &workload, store).await
            }
            ScenarioKind::Multipart { size, chunk } => {
                let workload = MultipartUploadWorkload {
                    storage,
                    transport,
                    prefix,
                    size,
                    chunk,
                    strict_etag: self.strict_etag,
                };
                self.sampler.run(scenario, &workload, store).await
            }
        }
    }

    async fn flush(
        &self,
        summary: &SampleSummary,
        store: &MeasurementStore,
    ) -> Result<(), BenchError> {
        println!(
            "{}: {} samples, mean {:.2} ms",
            summary.name, summary.samples, summary.mean_ms
        );
        tracing::info!(
            scenario = %summary.name,
            samples = summary.samples,
            mean_ms = summary.mean_ms,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Scenario finished"
        );

        store.persist(&self.results_path)?;
        let removed = self.storage.empty_bucket().await?;
        tracing::debug!(removed, "Bucket emptied");
        Ok(())
    }
}
