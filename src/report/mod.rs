//! Offline reporting over a persisted measurement store
//!
//! Three reports come out of one store:
//! - micro-benchmarks: the bare operations, mean ± std
//! - upload comparison: single PUT against each multipart chunk size, per file size
//! - multipart phases: part uploads and completion, stacked per chunk size
//!
//! Each report is printed as a table, written as a markdown file and drawn as
//! a chart. Series without samples come out as blank cells and chart gaps.

pub mod chart;
pub mod stats;
pub mod table;

pub use chart::{BarChart, BarSegment, BarStack, ChartRenderer, Line, LineChart, SvgRenderer};
pub use stats::Summary;

use crate::bench::{MetricKey, ScenarioRegistry};
use crate::config::Config;
use crate::size::{format_size, parse_size, SizeError};
use crate::store::{MeasurementStore, StoreError};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MICRO_BENCHMARKS: &str = "micro_benchmarks";
pub const UPLOAD_COMPARISON: &str = "upload_comparison";
pub const UPLOAD_COMPARISON_SMALL: &str = "upload_comparison_small";
pub const MULTIPART_PHASES: &str = "multipart_phases";

/// Report generation errors
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Size(#[from] SizeError),

    #[error("Failed to render chart: {0}")]
    Chart(String),
}

/// A rendered table: header plus rows of display cells
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn to_markdown(&self) -> String {
        table::markdown_table(&self.header, &self.rows)
    }
}

/// Builds reports from a store using the sweep plan in the configuration
pub struct Reporter<R: ChartRenderer> {
    registry: ScenarioRegistry,
    small_size_cutoff: u64,
    output_dir: PathBuf,
    renderer: R,
}

fn mean_of(store: &MeasurementStore, key: MetricKey) -> Option<f64> {
    Summary::of(store.samples(&key.name())).mean
}

fn size_header(first: &str, sizes: &[u64]) -> Vec<String> {
    std::iter::once(first.to_string())
        .chain(sizes.iter().map(|&s| format_size(s)))
        .collect()
}

fn row(label: String, values: &[Option<f64>]) -> Vec<String> {
    std::iter::once(label)
        .chain(values.iter().map(|v| stats::format_ms(*v)))
        .collect()
}

impl<R: ChartRenderer> Reporter<R> {
    pub fn new(config: &Config, renderer: R) -> Result<Self, ReportError> {
        Ok(Self {
            registry: ScenarioRegistry::from_config(&config.sweep)?,
            small_size_cutoff: parse_size(&config.report.small_size_cutoff)?,
            output_dir: config.report.output_dir.clone(),
            renderer,
        })
    }

    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Bare operation table and its bar chart
    pub fn micro_benchmarks(&self, store: &MeasurementStore) -> (TableData, BarChart) {
        let keys = self.registry.micro_keys();
        let summaries: Vec<Summary> = keys
            .iter()
            .map(|key| Summary::of(store.samples(&key.name())))
            .collect();

        let table = TableData {
            header: vec![
                "Operation".to_string(),
                "Time (ms)".to_string(),
                "Samples".to_string(),
            ],
            rows: keys
                .iter()
                .zip(&summaries)
                .map(|(key, s)| vec![key.name(), s.mean_pm_std(), s.count.to_string()])
                .collect(),
        };

        let chart = BarChart {
            title: "Micro-benchmarks".to_string(),
            x_label: "Operation".to_string(),
            y_label: "Mean time (ms)".to_string(),
            categories: keys.iter().map(MetricKey::name).collect(),
            stacks: vec![BarStack {
                label: "mean".to_string(),
                segments: vec![BarSegment {
                    label: "ms".to_string(),
                    values: summaries.iter().map(|s| s.mean).collect(),
                }],
            }],
            log_scale: false,
        };

        (table, chart)
    }

    /// Mean total time per upload strategy across `sizes`
    pub fn upload_comparison(&self, store: &MeasurementStore, sizes: &[u64]) -> (TableData, LineChart) {
        let traditional = self.registry.traditional_sizes();
        let mut series = vec![Line {
            label: "Traditional".to_string(),
            values: sizes
                .iter()
                .map(|&size| {
                    traditional
                        .contains(&size)
                        .then(|| mean_of(store, MetricKey::Upload { size }))
                        .flatten()
                })
                .collect(),
        }];

        for chunk in self.registry.chunk_sizes() {
            series.push(Line {
                label: format!("Multipart {}", format_size(chunk)),
                values: sizes
                    .iter()
                    .map(|&size| {
                        self.registry
                            .has_multipart(size, chunk)
                            .then(|| mean_of(store, MetricKey::Multipart { size, chunk }))
                            .flatten()
                    })
                    .collect(),
            });
        }

        let table = TableData {
            header: size_header("Upload type", sizes),
            rows: series
                .iter()
                .map(|line| row(line.label.clone(), &line.values))
                .collect(),
        };

        let chart = LineChart {
            title: "Upload time by file size".to_string(),
            x_label: "File size".to_string(),
            y_label: "Mean time (ms, log)".to_string(),
            categories: sizes.iter().map(|&s| format_size(s)).collect(),
            series,
            log_scale: true,
        };

        (table, chart)
    }

    /// Part-upload and completion time per chunk size, stacked
    pub fn multipart_phases(&self, store: &MeasurementStore) -> (TableData, BarChart) {
        let sizes = self.registry.multipart_sizes();
        let mut rows = Vec::new();
        let mut stacks = Vec::new();

        for chunk in self.registry.chunk_sizes() {
            let phase = |key: fn(u64, u64) -> MetricKey| -> Vec<Option<f64>> {
                sizes
                    .iter()
                    .map(|&size| {
                        self.registry
                            .has_multipart(size, chunk)
                            .then(|| mean_of(store, key(size, chunk)))
                            .flatten()
                    })
                    .collect()
            };
            let parts = phase(|size, chunk| MetricKey::MultipartParts { size, chunk });
            let complete = phase(|size, chunk| MetricKey::MultipartComplete { size, chunk });

            let chunk = format_size(chunk);
            rows.push(row(format!("{} parts", chunk), &parts));
            rows.push(row(format!("{} complete", chunk), &complete));
            stacks.push(BarStack {
                label: chunk,
                segments: vec![
                    BarSegment {
                        label: "parts".to_string(),
                        values: parts,
                    },
                    BarSegment {
                        label: "complete".to_string(),
                        values: complete,
                    },
                ],
            });
        }

        let table = TableData {
            header: size_header("Chunk / phase", &sizes),
            rows,
        };

        let chart = BarChart {
            title: "Multipart phase breakdown".to_string(),
            x_label: "File size".to_string(),
            y_label: "Mean time (ms, log)".to_string(),
            categories: sizes.iter().map(|&s| format_size(s)).collect(),
            stacks,
            log_scale: true,
        };

        (table, chart)
    }

    /// Stored series the configured plan never reads
    pub fn unplanned_keys(&self, store: &MeasurementStore) -> Vec<String> {
        let planned = self.registry.metric_names();
        store
            .iter()
            .map(|(name, _)| name)
            .filter(|name| !planned.iter().any(|p| p == name))
            .map(str::to_string)
            .collect()
    }

    /// Write every report under the output directory, printing each table.
    ///
    /// Returns the paths written. An existing directory is reused.
    #[tracing::instrument(name = "report.generate", skip(self, store), fields(output_dir = %self.output_dir.display()), err)]
    pub fn generate(&self, store: &MeasurementStore) -> Result<Vec<PathBuf>, ReportError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let mut written = Vec::new();

        let unplanned = self.unplanned_keys(store);
        if !unplanned.is_empty() {
            tracing::warn!(
                keys = ?unplanned,
                "Results hold series outside the configured sweep; pass the sweep's config to report them"
            );
        }

        let (micro_table, micro_chart) = self.micro_benchmarks(store);
        written.push(self.write_report(
            MICRO_BENCHMARKS,
            "Micro-benchmarks",
            &micro_table,
            &[MICRO_BENCHMARKS],
        )?);
        written.push(self.svg_path(MICRO_BENCHMARKS));
        self.renderer
            .render_bars(&micro_chart, &self.svg_path(MICRO_BENCHMARKS))?;

        let all_sizes = self.registry.all_sizes();
        let (upload_table, upload_chart) = self.upload_comparison(store, &all_sizes);
        written.push(self.write_report(
            UPLOAD_COMPARISON,
            "Upload comparison",
            &upload_table,
            &[UPLOAD_COMPARISON, UPLOAD_COMPARISON_SMALL],
        )?);
        written.push(self.svg_path(UPLOAD_COMPARISON));
        self.renderer
            .render_lines(&upload_chart, &self.svg_path(UPLOAD_COMPARISON))?;

        let small_sizes: Vec<u64> = all_sizes
            .into_iter()
            .filter(|&s| s <= self.small_size_cutoff)
            .collect();
        let (_, mut small_chart) = self.upload_comparison(store, &small_sizes);
        small_chart.title = format!(
            "Upload time by file size (up to {})",
            format_size(self.small_size_cutoff)
        );
        written.push(self.svg_path(UPLOAD_COMPARISON_SMALL));
        self.renderer
            .render_lines(&small_chart, &self.svg_path(UPLOAD_COMPARISON_SMALL))?;

        let (phase_table, phase_chart) = self.multipart_phases(store);
        written.push(self.write_report(
            MULTIPART_PHASES,
            "Multipart phase breakdown",
            &phase_table,
            &[MULTIPART_PHASES],
        )?);
        written.push(self.svg_path(MULTIPART_PHASES));
        self.renderer
            .render_bars(&phase_chart, &self.svg_path(MULTIPART_PHASES))?;

        tracing::info!(files = written.len(), "Reports written");
        Ok(written)
    }

    fn svg_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.svg", name))
    }

    fn write_report(
        &self,
        name: &str,
        title: &str,
        data: &TableData,
        images: &[&str],
    ) -> Result<PathBuf, ReportError> {
        let markdown = data.to_markdown();
        println!("{}\n{}\n", title, markdown);

        let images: Vec<String> = images.iter().map(|i| format!("{}.svg", i)).collect();
        let images: Vec<&str> = images.iter().map(String::as_str).collect();
        let path = self.output_dir.join(format!("{}.md", name));
        std::fs::write(&path, table::markdown_document(title, &images, &markdown))?;
        Ok(path)
    }
}

/// Load `results` and write every report
pub fn generate_from_file<R: ChartRenderer>(
    reporter: &Reporter<R>,
    results: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, ReportError> {
    let store = MeasurementStore::load(results)?;
    reporter.generate(&store)
}
