//! Aegis Types - shared data model for the verification gate
//!
//! A score is a non-conformity measure in [0.0, 1.0]: 0.0 means the
//! scanning signal found nothing, 1.0 means maximal risk or an
//! unscannable sample (fail-closed). The score of a sample is derived
//! from its single worst finding, never from the finding count; this is
//! intentional and changing it would silently change the meaning of any
//! calibrated threshold.

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Fallback acceptance threshold used when no calibration record can be
/// loaded at gate startup.
pub const DEFAULT_THRESHOLD: f64 = 0.15;

/// Severity of a finding reported by a risk signal.
///
/// Ordered: `None < Low < Medium < High`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
}

impl Severity {
    /// Fixed monotonic severity → score table.
    pub fn score(&self) -> f64 {
        match self {
            Severity::None => 0.0,
            Severity::Low => 0.1,
            Severity::Medium => 0.5,
            Severity::High => 1.0,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::None => write!(f, "NONE"),
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// A single issue discovered by a risk signal in a code sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Signal-specific category (e.g. a Bandit test id such as `B102`).
    pub category: String,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    /// Line in the scanned sample, when the signal reports one.
    #[serde(default)]
    pub line: Option<u64>,
}

/// Output of one risk-signal evaluation over a self-contained code unit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalReport {
    pub findings: Vec<Finding>,
    /// False when the signal could not parse the sample as valid code.
    pub parse_ok: bool,
}

impl SignalReport {
    /// A report for a sample that parsed cleanly with no findings.
    pub fn clean() -> Self {
        Self {
            findings: vec![],
            parse_ok: true,
        }
    }

    /// A report for a sample the signal could not parse.
    pub fn unparseable() -> Self {
        Self {
            findings: vec![],
            parse_ok: false,
        }
    }

    /// The single highest-severity finding, if any.
    pub fn worst_finding(&self) -> Option<&Finding> {
        self.findings.iter().max_by_key(|f| f.severity)
    }
}

/// Verification decision status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionStatus {
    Pass,
    Reject,
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionStatus::Pass => write!(f, "PASS"),
            DecisionStatus::Reject => write!(f, "REJECT"),
        }
    }
}

/// Immutable result of one verification call.
///
/// `status` is `Pass` iff `score <= threshold`. This shape is the
/// contract consumed by any CLI, API, or dashboard layer built on the
/// gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub status: DecisionStatus,
    /// Non-conformity score in [0.0, 1.0].
    pub score: f64,
    /// Threshold (q̂) the score was compared against.
    pub threshold: f64,
    /// Human-readable explanation referencing score and threshold.
    pub reason: String,
    #[serde(default)]
    pub latency_ms: Option<f64>,
}

impl Decision {
    pub fn passed(&self) -> bool {
        self.status == DecisionStatus::Pass
    }
}

/// One sample of the calibration set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    pub code: String,
    /// Marks synthetic known-risky samples mixed into the set to
    /// guarantee high-score mass. Bookkeeping only; scoring ignores it.
    #[serde(default)]
    pub injected: bool,
}

impl CalibrationSample {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            injected: false,
        }
    }

    pub fn injected(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            injected: true,
        }
    }
}

/// Durable record of one calibration run: the threshold scalar plus the
/// metadata needed to reproduce and audit it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    /// Calibrated quantile threshold, in [0.0, 1.0].
    pub q_hat: f64,
    /// Risk tolerance the run targeted.
    pub alpha: f64,
    pub n_samples: usize,
    /// Fraction of the set overwritten with synthetic risky samples.
    pub injection_rate: f64,
    /// Raw non-conformity scores of the calibration set.
    #[serde(default)]
    pub scores: Vec<f64>,
    /// Name of the sample source.
    #[serde(default)]
    pub dataset: String,
    /// Short content fingerprint of the sample set.
    #[serde(default)]
    pub dataset_fingerprint: String,
    /// Name of the risk signal that produced the scores.
    #[serde(default)]
    pub signal: String,
    pub calibrated_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order_is_monotonic() {
        assert!(Severity::None < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn severity_score_table() {
        assert_eq!(Severity::None.score(), 0.0);
        assert_eq!(Severity::Low.score(), 0.1);
        assert_eq!(Severity::Medium.score(), 0.5);
        assert_eq!(Severity::High.score(), 1.0);
    }

    #[test]
    fn worst_finding_picks_highest_severity() {
        let report = SignalReport {
            findings: vec![
                Finding {
                    category: "B311".into(),
                    severity: Severity::Low,
                    description: "weak random".into(),
                    line: Some(1),
                },
                Finding {
                    category: "B102".into(),
                    severity: Severity::Medium,
                    description: "exec used".into(),
                    line: Some(3),
                },
            ],
            parse_ok: true,
        };
        assert_eq!(report.worst_finding().unwrap().category, "B102");
    }

    #[test]
    fn decision_status_serializes_to_contract_strings() {
        let decision = Decision {
            status: DecisionStatus::Pass,
            score: 0.0,
            threshold: DEFAULT_THRESHOLD,
            reason: "code meets the acceptance threshold".into(),
            latency_ms: None,
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["status"], "PASS");

        let rejected = Decision {
            status: DecisionStatus::Reject,
            ..decision
        };
        let json = serde_json::to_value(&rejected).unwrap();
        assert_eq!(json["status"], "REJECT");
    }

    #[test]
    fn calibration_record_round_trips() {
        let record = CalibrationRecord {
            q_hat: 0.1,
            alpha: 0.1,
            n_samples: 100,
            injection_rate: 0.2,
            scores: vec![0.0, 0.1, 1.0],
            dataset: "static".into(),
            dataset_fingerprint: "abc123".into(),
            signal: "bandit".into(),
            calibrated_at: chrono::Utc::now(),
            notes: String::new(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: CalibrationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
