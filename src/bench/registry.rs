//! Scenario registry
//!
//! Turns the configured size sets into the fixed, ordered list of scenarios a
//! sweep runs, and names every measurement series through [`MetricKey`] so
//! the sweep and the reporter agree on keys without string assembly.

use crate::config::SweepConfig;
use crate::size::{format_size, parse_size, SizeError};
use crate::upload::MIN_PART_SIZE;
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Name of one measurement series in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricKey {
    PresignPut,
    InitiateMultipart,
    PresignPart,
    Upload { size: u64 },
    Multipart { size: u64, chunk: u64 },
    MultipartParts { size: u64, chunk: u64 },
    MultipartComplete { size: u64, chunk: u64 },
}

impl MetricKey {
    pub fn name(&self) -> String {
        match *self {
            MetricKey::PresignPut => "presign_put_url".to_string(),
            MetricKey::InitiateMultipart => "initiate_multipart_upload".to_string(),
            MetricKey::PresignPart => "presign_upload_part".to_string(),
            MetricKey::Upload { size } => format!("upload_{}", format_size(size)),
            MetricKey::Multipart { size, chunk } => {
                format!("multipart_{}_{}", format_size(size), format_size(chunk))
            }
            MetricKey::MultipartParts { size, chunk } => {
                format!("multipart_{}_{}_parts", format_size(size), format_size(chunk))
            }
            MetricKey::MultipartComplete { size, chunk } => {
                format!("multipart_{}_{}_complete", format_size(size), format_size(chunk))
            }
        }
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// What a scenario measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Bare presigned PUT URL issuance
    PresignPut,
    /// Bare multipart initiation
    InitiateMultipart,
    /// Bare part URL presigning against one long-lived upload
    PresignPart,
    /// Whole object through one presigned PUT
    SingleUpload { size: u64 },
    /// Initiate, upload every part, complete
    Multipart { size: u64, chunk: u64 },
}

impl ScenarioKind {
    /// Series receiving the whole-iteration duration
    pub fn key(&self) -> MetricKey {
        match *self {
            ScenarioKind::PresignPut => MetricKey::PresignPut,
            ScenarioKind::InitiateMultipart => MetricKey::InitiateMultipart,
            ScenarioKind::PresignPart => MetricKey::PresignPart,
            ScenarioKind::SingleUpload { size } => MetricKey::Upload { size },
            ScenarioKind::Multipart { size, chunk } => MetricKey::Multipart { size, chunk },
        }
    }

    /// Extra per-phase series recorded alongside [`ScenarioKind::key`]
    pub fn phase_keys(&self) -> Vec<MetricKey> {
        match *self {
            ScenarioKind::Multipart { size, chunk } => vec![
                MetricKey::MultipartParts { size, chunk },
                MetricKey::MultipartComplete { size, chunk },
            ],
            _ => Vec::new(),
        }
    }

    /// Bytes transferred per iteration, if any
    pub fn transfer_size(&self) -> Option<u64> {
        match *self {
            ScenarioKind::SingleUpload { size } | ScenarioKind::Multipart { size, .. } => {
                Some(size)
            }
            _ => None,
        }
    }
}

/// One independently measured benchmark case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub kind: ScenarioKind,
    /// Sampling stops once this has elapsed and the sample floor is met
    pub budget: Duration,
}

impl Scenario {
    pub fn name(&self) -> String {
        self.kind.key().name()
    }

    /// Object key prefix for everything this scenario writes
    pub fn prefix(&self) -> String {
        self.name()
    }
}

/// Parsed sweep plan
#[derive(Debug, Clone)]
pub struct ScenarioRegistry {
    traditional_sizes: Vec<u64>,
    small_sizes: Vec<u64>,
    small_chunks: Vec<u64>,
    large_sizes: Vec<u64>,
    large_chunks: Vec<u64>,
    large_size_threshold: u64,
    default_budget: Duration,
    large_budget_multiplier: u32,
}

fn parse_all(sizes: &[String]) -> Result<Vec<u64>, SizeError> {
    let mut parsed: Vec<u64> = Vec::with_capacity(sizes.len());
    for size in sizes {
        let bytes = parse_size(size)?;
        if !parsed.contains(&bytes) {
            parsed.push(bytes);
        }
    }
    Ok(parsed)
}

fn sorted_union<'a>(sets: impl IntoIterator<Item = &'a Vec<u64>>) -> Vec<u64> {
    sets.into_iter()
        .flatten()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl ScenarioRegistry {
    pub fn from_config(config: &SweepConfig) -> Result<Self, SizeError> {
        Ok(Self {
            traditional_sizes: parse_all(&config.traditional_sizes)?,
            small_sizes: parse_all(&config.multipart_small_sizes)?,
            small_chunks: parse_all(&config.multipart_small_chunks)?,
            large_sizes: parse_all(&config.multipart_large_sizes)?,
            large_chunks: parse_all(&config.multipart_large_chunks)?,
            large_size_threshold: parse_size(&config.large_size_threshold)?,
            default_budget: Duration::from_millis(config.default_budget_ms),
            large_budget_multiplier: config.large_budget_multiplier,
        })
    }

    /// Time budget for a scenario moving `size` bytes per iteration
    pub fn budget_for(&self, size: Option<u64>) -> Duration {
        match size {
            Some(size) if size >= self.large_size_threshold => {
                self.default_budget * self.large_budget_multiplier
            }
            _ => self.default_budget,
        }
    }

    /// Every `(size, chunk)` pair, small set first, without duplicates
    pub fn multipart_pairs(&self) -> Vec<(u64, u64)> {
        let small = self
            .small_sizes
            .iter()
            .flat_map(|&size| self.small_chunks.iter().map(move |&chunk| (size, chunk)));
        let large = self
            .large_sizes
            .iter()
            .flat_map(|&size| self.large_chunks.iter().map(move |&chunk| (size, chunk)));

        let mut pairs: Vec<(u64, u64)> = Vec::new();
        for pair in small.chain(large) {
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
        pairs
    }

    /// The full ordered scenario list
    pub fn scenarios(&self) -> Vec<Scenario> {
        let mut kinds: Vec<ScenarioKind> = self
            .traditional_sizes
            .iter()
            .map(|&size| ScenarioKind::SingleUpload { size })
            .collect();

        for (size, chunk) in self.multipart_pairs() {
            if chunk < MIN_PART_SIZE && size > chunk {
                tracing::warn!(
                    size = %format_size(size),
                    chunk = %format_size(chunk),
                    "Chunk is below the S3 minimum part size; backends may reject the upload"
                );
            }
            kinds.push(ScenarioKind::Multipart { size, chunk });
        }

        kinds.extend([
            ScenarioKind::PresignPut,
            ScenarioKind::InitiateMultipart,
            ScenarioKind::PresignPart,
        ]);

        kinds
            .into_iter()
            .map(|kind| Scenario {
                kind,
                budget: self.budget_for(kind.transfer_size()),
            })
            .collect()
    }

    /// Metric keys of the bare-operation micro-benchmarks
    pub fn micro_keys(&self) -> [MetricKey; 3] {
        [
            MetricKey::PresignPut,
            MetricKey::InitiateMultipart,
            MetricKey::PresignPart,
        ]
    }

    /// Names of every series the plan records, phases included
    pub fn metric_names(&self) -> Vec<String> {
        let uploads = self
            .traditional_sizes
            .iter()
            .map(|&size| MetricKey::Upload { size });
        let multipart = self.multipart_pairs().into_iter().flat_map(|(size, chunk)| {
            [
                MetricKey::Multipart { size, chunk },
                MetricKey::MultipartParts { size, chunk },
                MetricKey::MultipartComplete { size, chunk },
            ]
        });
        self.micro_keys()
            .into_iter()
            .chain(uploads)
            .chain(multipart)
            .map(|key| key.name())
            .collect()
    }

    pub fn traditional_sizes(&self) -> &[u64] {
        &self.traditional_sizes
    }

    /// Chunk sizes in configuration order, small set first
    pub fn chunk_sizes(&self) -> Vec<u64> {
        let mut chunks: Vec<u64> = Vec::new();
        for &chunk in self.small_chunks.iter().chain(&self.large_chunks) {
            if !chunks.contains(&chunk) {
                chunks.push(chunk);
            }
        }
        chunks
    }

    /// Whether `(size, chunk)` is part of the plan
    pub fn has_multipart(&self, size: u64, chunk: u64) -> bool {
        self.multipart_pairs().contains(&(size, chunk))
    }

    /// Ascending union of every configured transfer size
    pub fn all_sizes(&self) -> Vec<u64> {
        sorted_union([
            &self.traditional_sizes,
            &self.small_sizes,
            &self.large_sizes,
        ])
    }

    /// Ascending union of the multipart transfer sizes
    pub fn multipart_sizes(&self) -> Vec<u64> {
        sorted_union([&self.small_sizes, &self.large_sizes])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    fn sweep_config() -> SweepConfig {
        SweepConfig {
            traditional_sizes: vec!["1m".into(), "5m".into(), "500m".into()],
            multipart_small_sizes: vec!["5m".into(), "10m".into()],
            multipart_small_chunks: vec!["5m".into()],
            multipart_large_sizes: vec!["500m".into()],
            multipart_large_chunks: vec!["50m".into(), "100m".into()],
            large_size_threshold: "500m".into(),
            default_budget_ms: 1000,
            large_budget_multiplier: 5,
            ..SweepConfig::default()
        }
    }

    #[test]
    fn test_metric_key_names() {
        assert_eq!(MetricKey::PresignPut.name(), "presign_put_url");
        assert_eq!(MetricKey::Upload { size: 512 * 1024 }.name(), "upload_512k");
        assert_eq!(
            MetricKey::Multipart {
                size: 10 * MIB,
                chunk: 5 * MIB
            }
            .name(),
            "multipart_10m_5m"
        );
        assert_eq!(
            MetricKey::MultipartParts {
                size: 10 * MIB,
                chunk: 5 * MIB
            }
            .to_string(),
            "multipart_10m_5m_parts"
        );
        assert_eq!(
            MetricKey::MultipartComplete {
                size: 1024 * MIB,
                chunk: 100 * MIB
            }
            .name(),
            "multipart_1g_100m_complete"
        );
    }

    #[test]
    fn test_scenario_order_and_count() {
        let registry = ScenarioRegistry::from_config(&sweep_config()).unwrap();
        let names: Vec<String> = registry.scenarios().iter().map(Scenario::name).collect();

        assert_eq!(
            names,
            vec![
                "upload_1m",
                "upload_5m",
                "upload_500m",
                "multipart_5m_5m",
                "multipart_10m_5m",
                "multipart_500m_50m",
                "multipart_500m_100m",
                "presign_put_url",
                "initiate_multipart_upload",
                "presign_upload_part",
            ]
        );
    }

    #[test]
    fn test_scenarios_are_deterministic_and_unique() {
        let registry = ScenarioRegistry::from_config(&sweep_config()).unwrap();
        let first = registry.scenarios();
        assert_eq!(first, registry.scenarios());

        let names: BTreeSet<String> = first.iter().map(Scenario::name).collect();
        assert_eq!(names.len(), first.len());
    }

    #[test]
    fn test_large_sizes_get_extended_budget() {
        let registry = ScenarioRegistry::from_config(&sweep_config()).unwrap();
        for scenario in registry.scenarios() {
            let expected = match scenario.kind.transfer_size() {
                Some(size) if size >= 500 * MIB => Duration::from_secs(5),
                _ => Duration::from_secs(1),
            };
            assert_eq!(scenario.budget, expected, "{}", scenario.name());
        }
    }

    #[test]
    fn test_multipart_phase_keys_share_prefix() {
        let kind = ScenarioKind::Multipart {
            size: 10 * MIB,
            chunk: 5 * MIB,
        };
        let total = kind.key().name();
        for phase in kind.phase_keys() {
            assert!(phase.name().starts_with(&total));
        }
        assert_eq!(kind.phase_keys().len(), 2);
        assert!(ScenarioKind::PresignPut.phase_keys().is_empty());
    }

    #[test]
    fn test_duplicate_pairs_are_dropped() {
        let mut config = sweep_config();
        config.multipart_large_sizes = vec!["10m".into()];
        config.multipart_large_chunks = vec!["5m".into()];
        config.multipart_small_sizes.push("10m".into());

        let registry = ScenarioRegistry::from_config(&config).unwrap();
        assert_eq!(
            registry.multipart_pairs(),
            vec![(5 * MIB, 5 * MIB), (10 * MIB, 5 * MIB)]
        );
    }

    #[test]
    fn test_size_sets() {
        let registry = ScenarioRegistry::from_config(&sweep_config()).unwrap();
        assert_eq!(registry.all_sizes(), vec![MIB, 5 * MIB, 10 * MIB, 500 * MIB]);
        assert_eq!(registry.multipart_sizes(), vec![5 * MIB, 10 * MIB, 500 * MIB]);
        assert_eq!(registry.chunk_sizes(), vec![5 * MIB, 50 * MIB, 100 * MIB]);
        assert!(registry.has_multipart(500 * MIB, 50 * MIB));
        assert!(!registry.has_multipart(5 * MIB, 50 * MIB));
    }

    #[test]
    fn test_invalid_size_is_rejected() {
        let mut config = sweep_config();
        config.multipart_small_chunks = vec!["5MB".into()];
        assert!(matches!(
            ScenarioRegistry::from_config(&config),
            Err(SizeError::InvalidSizeFormat(_))
        ));
    }
}
