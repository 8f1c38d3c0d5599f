//! Aegis Gate - the verification commander
//!
//! Compares fail-closed non-conformity scores against the calibrated
//! threshold q̂ to make accept/reject decisions. Each commander owns one
//! immutable threshold for its lifetime; changing the threshold means
//! constructing a new commander, so concurrent verify calls can never
//! observe a half-updated value.

#![deny(unsafe_code)]

use std::sync::Arc;
use std::time::Instant;

use aegis_scorer::Scorer;
use aegis_store::ThresholdStore;
use aegis_types::{Decision, DecisionStatus, Finding, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};

/// A decision together with the findings that produced it, for callers
/// (like the correction loop) that build structured feedback.
#[derive(Clone, Debug)]
pub struct Verdict {
    pub decision: Decision,
    pub findings: Vec<Finding>,
}

impl Verdict {
    /// Category of the single worst finding, if any.
    pub fn worst_category(&self) -> Option<&str> {
        self.findings
            .iter()
            .max_by_key(|f| f.severity)
            .map(|f| f.category.as_str())
    }
}

/// Gate configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Threshold used when no calibration record can be loaded.
    pub default_threshold: f64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// The verification gate for machine-generated code.
///
/// `verify` is idempotent for a fixed code string and threshold, and has
/// no side effects beyond the scorer's scratch-file cleanup.
pub struct Commander {
    scorer: Arc<Scorer>,
    threshold: f64,
}

impl Commander {
    /// Construct from a persisted calibration record.
    ///
    /// A missing, corrupt, or unreadable record is recoverable: the
    /// commander logs a warning and falls back to the configured
    /// default threshold.
    pub fn load(scorer: Arc<Scorer>, store: &dyn ThresholdStore, config: VerifierConfig) -> Self {
        let threshold = match store.load() {
            Ok(Some(record)) => {
                tracing::info!(
                    q_hat = record.q_hat,
                    calibrated_at = %record.calibrated_at,
                    "loaded calibrated threshold"
                );
                record.q_hat.clamp(0.0, 1.0)
            }
            Ok(None) => {
                tracing::warn!(
                    default = config.default_threshold,
                    "no calibration record found; using default threshold"
                );
                config.default_threshold
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    default = config.default_threshold,
                    "calibration record unreadable; using default threshold"
                );
                config.default_threshold
            }
        };

        Self { scorer, threshold }
    }

    /// Construct with an explicit threshold, bypassing persistence.
    pub fn with_threshold(scorer: Arc<Scorer>, threshold: f64) -> Self {
        Self {
            scorer,
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// New commander sharing this scorer but holding a different
    /// threshold. Reconstruction, never in-place mutation.
    pub fn reconfigured(&self, threshold: f64) -> Self {
        Self::with_threshold(self.scorer.clone(), threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Verify a code string against the commander's threshold.
    pub async fn verify(&self, code: &str) -> Decision {
        self.verify_against(code, self.threshold).await
    }

    /// Verify and keep the findings alongside the decision.
    pub async fn verify_detailed(&self, code: &str) -> Verdict {
        self.verdict(code, self.threshold).await
    }

    /// Verify against an explicit per-call threshold.
    pub async fn verify_against(&self, code: &str, threshold: f64) -> Decision {
        self.verdict(code, threshold).await.decision
    }

    async fn verdict(&self, code: &str, threshold: f64) -> Verdict {
        let started = Instant::now();
        let outcome = self.scorer.score_detailed(code).await;
        let passed = outcome.score <= threshold;

        let reason = if passed {
            format!(
                "score {:.4} within threshold {:.4}",
                outcome.score, threshold
            )
        } else if let Some(failure) = &outcome.failure {
            format!(
                "{}; fail-closed score {:.4} exceeds threshold {:.4}",
                failure.describe(),
                outcome.score,
                threshold
            )
        } else {
            match outcome.findings.iter().max_by_key(|f| f.severity) {
                Some(worst) => format!(
                    "score {:.4} exceeds threshold {:.4} (worst finding: {})",
                    outcome.score, threshold, worst.category
                ),
                None => format!(
                    "score {:.4} exceeds threshold {:.4}",
                    outcome.score, threshold
                ),
            }
        };

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        if passed {
            tracing::info!(score = outcome.score, threshold, "code approved");
        } else {
            tracing::warn!(score = outcome.score, threshold, reason = %reason, "code rejected");
        }

        Verdict {
            decision: Decision {
                status: if passed {
                    DecisionStatus::Pass
                } else {
                    DecisionStatus::Reject
                },
                score: outcome.score,
                threshold,
                reason,
                latency_ms: Some(latency_ms),
            },
            findings: outcome.findings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_scorer::{BanditConfig, BanditSignal, PatternSignal};
    use aegis_store::{JsonThresholdStore, MemoryThresholdStore};
    use aegis_types::CalibrationRecord;

    fn pattern_scorer() -> Arc<Scorer> {
        Arc::new(Scorer::new(Arc::new(PatternSignal::new())))
    }

    fn record(q_hat: f64) -> CalibrationRecord {
        CalibrationRecord {
            q_hat,
            alpha: 0.1,
            n_samples: 100,
            injection_rate: 0.2,
            scores: vec![],
            dataset: "static".into(),
            dataset_fingerprint: String::new(),
            signal: "pattern".into(),
            calibrated_at: chrono::Utc::now(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn clean_code_passes_at_default_threshold() {
        let commander = Commander::load(
            pattern_scorer(),
            &MemoryThresholdStore::new(),
            VerifierConfig::default(),
        );
        let decision = commander.verify("print('hello')").await;

        assert_eq!(decision.status, DecisionStatus::Pass);
        assert_eq!(decision.score, 0.0);
        assert_eq!(decision.threshold, DEFAULT_THRESHOLD);
        assert!(decision.latency_ms.is_some());
    }

    #[tokio::test]
    async fn high_severity_code_is_rejected() {
        let commander = Commander::load(
            pattern_scorer(),
            &MemoryThresholdStore::new(),
            VerifierConfig::default(),
        );
        let decision = commander.verify("eval(input())").await;

        assert_eq!(decision.status, DecisionStatus::Reject);
        assert_eq!(decision.score, 1.0);
        assert!(decision.reason.contains("exceeds threshold"));
    }

    #[tokio::test]
    async fn unavailable_signal_rejects_with_cause() {
        let scorer = Arc::new(Scorer::new(Arc::new(BanditSignal::new(BanditConfig {
            program: "aegis-no-such-analyzer".into(),
            ..Default::default()
        }))));
        let commander = Commander::with_threshold(scorer, DEFAULT_THRESHOLD);

        let decision = commander.verify("print('hello')").await;
        assert_eq!(decision.status, DecisionStatus::Reject);
        assert_eq!(decision.score, 1.0);
        assert!(decision.reason.contains("unavailable"));
    }

    #[tokio::test]
    async fn score_equal_to_threshold_passes() {
        // shell=True is a medium finding, score 0.5.
        let commander = Commander::with_threshold(pattern_scorer(), 0.5);
        let decision = commander
            .verify("subprocess.call(cmd, shell=True)")
            .await;
        assert_eq!(decision.status, DecisionStatus::Pass);
        assert_eq!(decision.score, 0.5);
    }

    #[tokio::test]
    async fn threshold_is_loaded_from_store() {
        let store = MemoryThresholdStore::with_record(record(0.6));
        let commander = Commander::load(pattern_scorer(), &store, VerifierConfig::default());
        assert_eq!(commander.threshold(), 0.6);

        // Medium finding (0.5) now passes under the calibrated 0.6.
        let decision = commander.verify("password = 'secret'").await;
        assert_eq!(decision.status, DecisionStatus::Pass);
    }

    #[tokio::test]
    async fn corrupt_store_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        std::fs::write(&path, "{broken").unwrap();

        let store = JsonThresholdStore::new(&path);
        let commander = Commander::load(pattern_scorer(), &store, VerifierConfig::default());
        assert_eq!(commander.threshold(), DEFAULT_THRESHOLD);
    }

    #[tokio::test]
    async fn loaded_threshold_is_clamped() {
        let store = MemoryThresholdStore::with_record(record(7.5));
        let commander = Commander::load(pattern_scorer(), &store, VerifierConfig::default());
        assert_eq!(commander.threshold(), 1.0);
    }

    #[tokio::test]
    async fn verdict_exposes_worst_category() {
        let commander = Commander::with_threshold(pattern_scorer(), 0.15);
        let verdict = commander.verify_detailed("eval(input())").await;
        assert_eq!(verdict.decision.status, DecisionStatus::Reject);
        assert_eq!(verdict.worst_category(), Some("AEG-EXEC-EVAL"));
    }

    #[tokio::test]
    async fn verify_is_idempotent() {
        let commander = Commander::with_threshold(pattern_scorer(), 0.15);
        let first = commander.verify("eval(input())").await;
        let second = commander.verify("eval(input())").await;

        assert_eq!(first.status, second.status);
        assert_eq!(first.score, second.score);
        assert_eq!(first.threshold, second.threshold);
        assert_eq!(first.reason, second.reason);
    }

    #[tokio::test]
    async fn per_call_override_changes_only_that_call() {
        let commander = Commander::with_threshold(pattern_scorer(), 0.15);

        let strict = commander.verify("password = 'secret'").await;
        assert_eq!(strict.status, DecisionStatus::Reject);

        let relaxed = commander.verify_against("password = 'secret'", 0.6).await;
        assert_eq!(relaxed.status, DecisionStatus::Pass);
        assert_eq!(relaxed.threshold, 0.6);

        assert_eq!(commander.threshold(), 0.15);
    }

    #[tokio::test]
    async fn reconfigured_builds_a_new_commander() {
        let commander = Commander::with_threshold(pattern_scorer(), 0.15);
        let relaxed = commander.reconfigured(1.0);

        assert_eq!(commander.threshold(), 0.15);
        assert_eq!(relaxed.threshold(), 1.0);

        // Even a fail-closed 1.0 passes a threshold of 1.0.
        let decision = relaxed.verify("eval(input())").await;
        assert_eq!(decision.status, DecisionStatus::Pass);
    }
}
