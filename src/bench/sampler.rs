//! Time-budgeted sampling
//!
//! A scenario moves through three states: setup (build the fixture once),
//! sampling (run iterations back to back) and flush (handled by the sweep).
//! Teardown runs untimed once sampling ends. Its error fails the scenario
//! unless an iteration already did.
//! Sampling continues while fewer than `min_samples` iterations have run or
//! the budget has not yet elapsed, so every scenario gets at least the floor
//! no matter how slow a single iteration is.

use super::{BenchError, MetricKey, Scenario};
use crate::store::MeasurementStore;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::time::Instant;

/// Sample floor per scenario
pub const MIN_SAMPLES: usize = 3;

/// Extra per-phase durations reported by one iteration
pub type Phases = Vec<(MetricKey, Duration)>;

/// One benchmark case
#[async_trait]
pub trait Workload: Send + Sync {
    /// State built once before sampling, such as a payload or an upload id
    type Fixture: Send + Sync;

    async fn setup(&self) -> Result<Self::Fixture, BenchError>;

    /// Run one timed iteration. The sampler times the whole call; returned
    /// phases are recorded under their own keys.
    async fn iterate(&self, fixture: &Self::Fixture) -> Result<Phases, BenchError>;

    /// Release backend state left behind by setup and the iterations
    async fn teardown(&self, _fixture: Self::Fixture) -> Result<(), BenchError> {
        Ok(())
    }
}


/// Outcome of one scenario
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSummary {
    pub name: String,
    pub samples: usize,
    pub mean_ms: f64,
    pub elapsed: Duration,
}

/// Runs workloads under a time budget
#[derive(Debug, Clone)]
pub struct Sampler {
    min_samples: usize,
    progress: bool,
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(MIN_SAMPLES)
    }
}

impl Sampler {
    pub fn new(min_samples: usize) -> Self {
        Self {
            min_samples: min_samples.max(1),
            progress: false,
        }
    }

    /// Show a spinner on stderr while sampling
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn spinner(&self, name: &str) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.green} {prefix:.bold} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_prefix(name.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    /// Measure `workload` for `scenario`, appending samples to `store`.
    ///
    /// The budget clock starts after setup, so payload generation is never
    /// charged to the scenario. An error in setup or in any iteration aborts
    /// the scenario; samples recorded before it stay in the store.
    #[tracing::instrument(
        name = "bench.scenario",
        skip(self, scenario, workload, store),
        fields(scenario = %scenario.name(), budget_ms = scenario.budget.as_millis() as u64),
        err
    )]
    pub async fn run<W: Workload>(
        &self,
        scenario: &Scenario,
        workload: &W,
        store: &mut MeasurementStore,
    ) -> Result<SampleSummary, BenchError> {
        let name = scenario.name();
        let key = scenario.kind.key();
        store.ensure(&name);
        for phase in scenario.kind.phase_keys() {
            store.ensure(&phase.name());
        }

        tracing::debug!("Setting up scenario");
        let fixture = workload.setup().await?;

        let pb = self.spinner(&name);
        let start = Instant::now();
        let mut samples = 0usize;
        let mut total_ms = 0u64;

        while samples < self.min_samples || start.elapsed() < scenario.budget {
            let iteration = Instant::now();
            let phases = match workload.iterate(&fixture).await {
                Ok(phases) => phases,
                Err(e) => {
                    pb.abandon_with_message(format!("failed after {} samples", samples));
                    if let Err(teardown) = workload.teardown(fixture).await {
                        tracing::warn!(error = %teardown, "Teardown after a failed iteration also failed");
                    }
                    return Err(e);
                }
            };
            let elapsed = iteration.elapsed();

            store.record(&key.name(), elapsed);
            for (phase, duration) in phases {
                store.record(&phase.name(), duration);
            }

            samples += 1;
            total_ms += elapsed.as_millis() as u64;
            pb.set_message(format!("{} samples, last {} ms", samples, elapsed.as_millis()));
        }
        pb.finish_and_clear();

        let summary = SampleSummary {
            name,
            samples,
            mean_ms: total_ms as f64 / samples as f64,
            elapsed: start.elapsed(),
        };
        workload.teardown(fixture).await?;
        Ok(summary)
    }
}
