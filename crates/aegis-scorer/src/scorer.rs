//! Fail-closed scoring front-end.

use std::sync::Arc;

use aegis_types::Finding;

use crate::error::SignalError;
use crate::sanitize::CodeSanitizer;
use crate::signal::RiskSignal;

/// Why a score collapsed to the fail-closed maximum.
///
/// Kept alongside the score so the gate's reason string can distinguish
/// "insecure" from "unscannable" without changing the decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScoreFailure {
    /// The signal tool is not installed or not reachable.
    SignalUnavailable(String),
    /// The signal did not finish within its deadline.
    Timeout,
    /// The sample failed to parse as valid code.
    Unparseable,
    /// Driving the signal process failed.
    Execution(String),
    /// The signal ran but its output could not be decoded.
    MalformedOutput(String),
}

impl ScoreFailure {
    /// Short phrase for decision reasons.
    pub fn describe(&self) -> &'static str {
        match self {
            ScoreFailure::SignalUnavailable(_) => "static analysis tool unavailable",
            ScoreFailure::Timeout => "static analysis timed out",
            ScoreFailure::Unparseable => "code could not be parsed",
            ScoreFailure::Execution(_) => "static analysis failed to run",
            ScoreFailure::MalformedOutput(_) => "analysis output could not be decoded",
        }
    }
}

impl From<SignalError> for ScoreFailure {
    fn from(err: SignalError) -> Self {
        match err {
            SignalError::ToolUnavailable { program } => ScoreFailure::SignalUnavailable(program),
            SignalError::Timeout { .. } => ScoreFailure::Timeout,
            SignalError::Io(e) => ScoreFailure::Execution(e.to_string()),
            SignalError::Decode(detail) => ScoreFailure::MalformedOutput(detail),
        }
    }
}

/// Result of one scoring call.
#[derive(Clone, Debug)]
pub struct ScoreOutcome {
    /// Non-conformity score in [0.0, 1.0].
    pub score: f64,
    /// Findings from the signal, empty on failure paths.
    pub findings: Vec<Finding>,
    /// Set when the score is the fail-closed maximum.
    pub failure: Option<ScoreFailure>,
}

/// Scores code with a risk signal, absorbing every failure into the
/// maximal score.
///
/// Stateless apart from the signal handle; calls are independent and
/// safe to run concurrently.
pub struct Scorer {
    signal: Arc<dyn RiskSignal>,
    sanitizer: CodeSanitizer,
}

impl Scorer {
    pub fn new(signal: Arc<dyn RiskSignal>) -> Self {
        Self {
            signal,
            sanitizer: CodeSanitizer::new(),
        }
    }

    pub fn signal_name(&self) -> &str {
        self.signal.name()
    }

    /// Score a code string. Never fails; see [`ScoreOutcome::failure`]
    /// for the cause when the result is the fail-closed 1.0.
    pub async fn score_detailed(&self, code: &str) -> ScoreOutcome {
        let sanitized = self.sanitizer.sanitize(code);

        let report = match self.signal.evaluate(&sanitized).await {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(signal = self.signal.name(), error = %err, "scoring fail-closed");
                return ScoreOutcome {
                    score: 1.0,
                    findings: vec![],
                    failure: Some(err.into()),
                };
            }
        };

        if !report.parse_ok {
            tracing::warn!(signal = self.signal.name(), "sample unparseable; fail-closed");
            return ScoreOutcome {
                score: 1.0,
                findings: vec![],
                failure: Some(ScoreFailure::Unparseable),
            };
        }

        let score = report
            .worst_finding()
            .map(|f| f.severity.score())
            .unwrap_or(0.0);

        ScoreOutcome {
            score,
            findings: report.findings,
            failure: None,
        }
    }

    /// Convenience wrapper returning only the score.
    pub async fn score(&self, code: &str) -> f64 {
        self.score_detailed(code).await.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bandit::{BanditConfig, BanditSignal};
    use crate::pattern::PatternSignal;
    use aegis_types::{Severity, SignalReport};
    use async_trait::async_trait;

    /// Signal double with a fixed report.
    struct FixedSignal(SignalReport);

    #[async_trait]
    impl RiskSignal for FixedSignal {
        fn name(&self) -> &str {
            "fixed"
        }
        async fn evaluate(&self, _code: &str) -> Result<SignalReport, SignalError> {
            Ok(self.0.clone())
        }
    }

    fn finding(severity: Severity) -> aegis_types::Finding {
        aegis_types::Finding {
            category: "T100".into(),
            severity,
            description: String::new(),
            line: None,
        }
    }

    #[tokio::test]
    async fn no_findings_scores_zero() {
        let scorer = Scorer::new(Arc::new(FixedSignal(SignalReport::clean())));
        assert_eq!(scorer.score("print('hello')").await, 0.0);
    }

    #[tokio::test]
    async fn worst_finding_wins_over_count() {
        // Two MEDIUM findings still score 0.5, not more.
        let scorer = Scorer::new(Arc::new(FixedSignal(SignalReport {
            findings: vec![finding(Severity::Medium), finding(Severity::Medium)],
            parse_ok: true,
        })));
        assert_eq!(scorer.score("x").await, 0.5);
    }

    #[tokio::test]
    async fn mixed_severities_take_the_maximum() {
        let scorer = Scorer::new(Arc::new(FixedSignal(SignalReport {
            findings: vec![
                finding(Severity::Low),
                finding(Severity::High),
                finding(Severity::Medium),
            ],
            parse_ok: true,
        })));
        assert_eq!(scorer.score("x").await, 1.0);
    }

    #[tokio::test]
    async fn unparseable_sample_fails_closed() {
        let scorer = Scorer::new(Arc::new(FixedSignal(SignalReport::unparseable())));
        let outcome = scorer.score_detailed("not code").await;
        assert_eq!(outcome.score, 1.0);
        assert_eq!(outcome.failure, Some(ScoreFailure::Unparseable));
    }

    #[tokio::test]
    async fn missing_tool_fails_closed() {
        let signal = BanditSignal::new(BanditConfig {
            program: "aegis-no-such-analyzer".to_string(),
            ..Default::default()
        });
        let scorer = Scorer::new(Arc::new(signal));
        let outcome = scorer.score_detailed("print('hello')").await;
        assert_eq!(outcome.score, 1.0);
        assert!(matches!(
            outcome.failure,
            Some(ScoreFailure::SignalUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn scoring_is_deterministic() {
        let scorer = Scorer::new(Arc::new(PatternSignal::new()));
        let code = "```python\neval(input())\n```";
        let first = scorer.score(code).await;
        let second = scorer.score(code).await;
        assert_eq!(first, second);
        assert_eq!(first, 1.0);
    }

    #[tokio::test]
    async fn fences_are_stripped_before_scanning() {
        let scorer = Scorer::new(Arc::new(PatternSignal::new()));
        let bare = scorer.score("print('hello')").await;
        let fenced = scorer.score("```python\nprint('hello')\n```").await;
        assert_eq!(bare, fenced);
    }
}
