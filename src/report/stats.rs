//! Per-series statistics

/// Mean and spread of one series; `None` when there is nothing to summarize
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

impl Summary {
    pub fn of(samples: Option<&[u64]>) -> Self {
        let samples = samples.unwrap_or_default();
        Self {
            count: samples.len(),
            mean: mean(samples),
            std_dev: std_dev(samples),
        }
    }

    /// `mean ± std` in milliseconds, blank when absent
    pub fn mean_pm_std(&self) -> String {
        match (self.mean, self.std_dev) {
            (Some(mean), Some(std)) => format!("{:.2} ± {:.2}", mean, std),
            _ => String::new(),
        }
    }
}

/// Arithmetic mean
pub fn mean(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let sum: f64 = samples.iter().map(|&s| s as f64).sum();
    Some(sum / samples.len() as f64)
}

/// Population standard deviation
pub fn std_dev(samples: &[u64]) -> Option<f64> {
    let mean = mean(samples)?;
    let variance = samples
        .iter()
        .map(|&s| {
            let diff = s as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / samples.len() as f64;
    Some(variance.sqrt())
}

/// Milliseconds with two decimals, blank when absent
pub fn format_ms(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}
