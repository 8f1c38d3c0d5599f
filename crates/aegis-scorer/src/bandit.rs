//! Canonical risk signal: Bandit (Python SAST) as an external process.
//!
//! Each evaluation writes the sample to an independently-named scratch
//! file, runs `bandit -f json -q --exit-zero` against it, and decodes
//! the JSON report. The scratch file is removed on every exit path,
//! including errors and timeout.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use aegis_types::{Finding, Severity, SignalReport};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::process::Command;

use crate::error::SignalError;
use crate::signal::RiskSignal;

/// Configuration for the Bandit signal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BanditConfig {
    /// Executable to invoke. Resolved via `PATH` unless absolute.
    pub program: String,
    /// Deadline for one evaluation.
    pub timeout_secs: u64,
    /// Directory for scratch files. System temp dir when unset; point
    /// this at a ramdisk for high-throughput scanning.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            program: "bandit".to_string(),
            timeout_secs: 30,
            scratch_dir: None,
        }
    }
}

/// Risk signal backed by the Bandit static analyzer.
pub struct BanditSignal {
    config: BanditConfig,
}

impl BanditSignal {
    pub fn new(config: BanditConfig) -> Self {
        Self { config }
    }

    fn write_scratch(&self, code: &str) -> Result<NamedTempFile, SignalError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("aegis-scan-").suffix(".py");
        let mut scratch = match &self.config.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        scratch.write_all(code.as_bytes())?;
        scratch.flush()?;
        Ok(scratch)
    }
}

impl Default for BanditSignal {
    fn default() -> Self {
        Self::new(BanditConfig::default())
    }
}

#[async_trait]
impl RiskSignal for BanditSignal {
    fn name(&self) -> &str {
        "bandit"
    }

    async fn evaluate(&self, code: &str) -> Result<SignalReport, SignalError> {
        // Dropped on every return below, deleting the file.
        let scratch = self.write_scratch(code)?;

        let run = Command::new(&self.config.program)
            .args(["-f", "json", "-q", "--exit-zero"])
            .arg(scratch.path())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(Duration::from_secs(self.config.timeout_secs), run)
            .await
            .map_err(|_| SignalError::Timeout {
                seconds: self.config.timeout_secs,
            })?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SignalError::ToolUnavailable {
                        program: self.config.program.clone(),
                    }
                } else {
                    SignalError::Io(e)
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_report(&stdout)
    }
}

// ── Bandit JSON report ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BanditReport {
    #[serde(default)]
    errors: Vec<BanditError>,
    #[serde(default)]
    results: Vec<BanditIssue>,
}

#[derive(Debug, Deserialize)]
struct BanditError {
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct BanditIssue {
    #[serde(default)]
    test_id: String,
    #[serde(default)]
    issue_severity: String,
    #[serde(default)]
    issue_text: String,
    #[serde(default)]
    line_number: Option<u64>,
}

/// Decode a Bandit JSON report into a [`SignalReport`].
///
/// A report with `errors` entries means the sample did not parse as
/// valid code; that is a property of the sample, not a signal failure.
fn parse_report(stdout: &str) -> Result<SignalReport, SignalError> {
    let report: BanditReport = serde_json::from_str(stdout)
        .map_err(|e| SignalError::Decode(format!("invalid bandit json: {e}")))?;

    if !report.errors.is_empty() {
        tracing::warn!(
            reason = %report.errors[0].reason,
            "bandit reported analysis errors; treating sample as unparseable"
        );
        return Ok(SignalReport::unparseable());
    }

    let findings = report
        .results
        .into_iter()
        .map(|issue| Finding {
            category: issue.test_id,
            severity: parse_severity(&issue.issue_severity),
            description: issue.issue_text,
            line: issue.line_number,
        })
        .collect();

    Ok(SignalReport {
        findings,
        parse_ok: true,
    })
}

fn parse_severity(raw: &str) -> Severity {
    match raw.to_ascii_uppercase().as_str() {
        "HIGH" => Severity::High,
        "MEDIUM" => Severity::Medium,
        // Unknown labels are kept conservative but non-fatal.
        _ => Severity::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_report_has_no_findings() {
        let report = parse_report(r#"{"errors": [], "results": []}"#).unwrap();
        assert!(report.parse_ok);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn findings_are_decoded_with_severity() {
        let json = r#"{
            "errors": [],
            "results": [
                {"test_id": "B102", "issue_severity": "MEDIUM",
                 "issue_text": "exec used", "line_number": 3},
                {"test_id": "B301", "issue_severity": "HIGH",
                 "issue_text": "pickle load", "line_number": 7}
            ]
        }"#;
        let report = parse_report(json).unwrap();
        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.worst_finding().unwrap().severity, Severity::High);
        assert_eq!(report.worst_finding().unwrap().category, "B301");
    }

    #[test]
    fn analysis_errors_mean_unparseable_sample() {
        let json = r#"{"errors": [{"reason": "syntax error"}], "results": []}"#;
        let report = parse_report(json).unwrap();
        assert!(!report.parse_ok);
    }

    #[test]
    fn garbage_output_is_a_decode_error() {
        let err = parse_report("bandit exploded").unwrap_err();
        assert!(matches!(err, SignalError::Decode(_)));
    }

    #[test]
    fn unknown_severity_defaults_to_low() {
        assert_eq!(parse_severity("WHATEVER"), Severity::Low);
        assert_eq!(parse_severity("low"), Severity::Low);
        assert_eq!(parse_severity("medium"), Severity::Medium);
    }

    #[tokio::test]
    async fn missing_executable_is_tool_unavailable() {
        let signal = BanditSignal::new(BanditConfig {
            program: "aegis-no-such-analyzer".to_string(),
            ..Default::default()
        });
        let err = signal.evaluate("print('hello')").await.unwrap_err();
        assert!(matches!(err, SignalError::ToolUnavailable { .. }));
    }
}
