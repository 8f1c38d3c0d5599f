//! Calibration sample sources and synthetic injection.
//!
//! General code corpora are not security-labeled, so a calibration set
//! drawn from one may contain almost no risky mass. The runner
//! therefore overwrites a trailing fraction of the set with known-risky
//! patterns before scoring. The `injected` flag on those samples is
//! bookkeeping only and never reaches the scorer.

use std::path::PathBuf;

use aegis_types::CalibrationSample;
use serde::Deserialize;

use crate::error::CalibrationError;

/// Known-risky code patterns used for synthetic injection, spanning the
/// severity range of the canonical signal.
pub const SYNTHETIC_RISK_PATTERNS: &[&str] = &[
    // High severity
    "import pickle\npickle.loads(untrusted_data)",
    "eval(user_input)",
    "exec(user_code)",
    "__import__('os').system(cmd)",
    // Medium severity
    "password = 'hardcoded_secret'",
    "api_key = 'sk-1234567890'",
    "subprocess.call(user_input, shell=True)",
    // Low severity
    "import random\nprint(random.random())",
    "assert user_is_admin",
];

/// Source of calibration samples.
pub trait SampleSource: Send + Sync {
    /// Name recorded in the calibration metadata.
    fn name(&self) -> &str;

    /// Load up to `n` samples. A source that cannot be read fails the
    /// whole calibration run.
    fn load(&self, n: usize) -> Result<Vec<CalibrationSample>, CalibrationError>;
}

/// Fixed in-memory sample list, for tests and offline runs.
pub struct StaticSampleSource {
    samples: Vec<CalibrationSample>,
}

impl StaticSampleSource {
    pub fn new(samples: Vec<CalibrationSample>) -> Self {
        Self { samples }
    }

    pub fn from_code(snippets: &[&str]) -> Self {
        Self::new(snippets.iter().map(|s| CalibrationSample::new(*s)).collect())
    }
}

impl SampleSource for StaticSampleSource {
    fn name(&self) -> &str {
        "static"
    }

    fn load(&self, n: usize) -> Result<Vec<CalibrationSample>, CalibrationError> {
        Ok(self.samples.iter().take(n).cloned().collect())
    }
}

#[derive(Deserialize)]
struct JsonlRow {
    code: String,
}

/// Samples read from a JSON-lines file, one `{"code": ...}` object per
/// line.
pub struct JsonlSampleSource {
    path: PathBuf,
    label: String,
}

impl JsonlSampleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = format!("jsonl:{}", path.display());
        Self { path, label }
    }
}

impl SampleSource for JsonlSampleSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn load(&self, n: usize) -> Result<Vec<CalibrationSample>, CalibrationError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            CalibrationError::DatasetLoad {
                dataset: self.label.clone(),
                detail: e.to_string(),
            }
        })?;

        let mut samples = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            if samples.len() == n {
                break;
            }
            let row: JsonlRow =
                serde_json::from_str(line).map_err(|e| CalibrationError::DatasetLoad {
                    dataset: self.label.clone(),
                    detail: format!("line {}: {e}", idx + 1),
                })?;
            samples.push(CalibrationSample::new(row.code));
        }

        if samples.len() < n {
            tracing::warn!(
                requested = n,
                available = samples.len(),
                dataset = %self.label,
                "fewer samples available than requested"
            );
        }

        Ok(samples)
    }
}

/// Overwrite the trailing `floor(rate * len)` samples with known-risky
/// patterns, marking them injected.
pub fn inject_synthetic(samples: &mut [CalibrationSample], rate: f64) {
    let count = (samples.len() as f64 * rate.clamp(0.0, 1.0)) as usize;
    let len = samples.len();

    tracing::info!(count, rate, "injecting synthetic risky samples");

    for i in 1..=count {
        let pattern = SYNTHETIC_RISK_PATTERNS[i % SYNTHETIC_RISK_PATTERNS.len()];
        samples[len - i] = CalibrationSample::injected(pattern);
    }
}
