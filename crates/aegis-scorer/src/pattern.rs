//! In-process pattern signal.
//!
//! Regex rules over known-dangerous Python constructs and hardcoded
//! secrets. Runs without any external tool, which also makes it the
//! signal of choice for offline calibration runs and tests. Severities
//! mirror what Bandit assigns to the same constructs.

use aegis_types::{Finding, Severity, SignalReport};
use async_trait::async_trait;
use regex::Regex;

use crate::error::SignalError;
use crate::signal::RiskSignal;

struct PatternRule {
    pattern: Regex,
    category: &'static str,
    severity: Severity,
    description: &'static str,
}

/// Risk signal that scans for dangerous constructs with regex rules.
pub struct PatternSignal {
    rules: Vec<PatternRule>,
}

impl PatternSignal {
    pub fn new() -> Self {
        let rule = |pattern: &str, category, severity, description| PatternRule {
            pattern: Regex::new(pattern).expect("static rule pattern"),
            category,
            severity,
            description,
        };
        Self {
            rules: vec![
                rule(
                    r"\beval\s*\(",
                    "AEG-EXEC-EVAL",
                    Severity::High,
                    "eval of dynamic input",
                ),
                rule(
                    r"\bexec\s*\(",
                    "AEG-EXEC-EXEC",
                    Severity::High,
                    "exec of dynamic input",
                ),
                rule(
                    r"pickle\.loads?\s*\(",
                    "AEG-DESER-PICKLE",
                    Severity::High,
                    "deserialization of untrusted data",
                ),
                rule(
                    r"__import__\s*\(",
                    "AEG-EXEC-IMPORT",
                    Severity::High,
                    "dynamic import",
                ),
                rule(
                    r"os\.system\s*\(",
                    "AEG-EXEC-SHELL",
                    Severity::High,
                    "shell command execution",
                ),
                rule(
                    r"shell\s*=\s*True",
                    "AEG-SUBPROC-SHELL",
                    Severity::Medium,
                    "subprocess with shell=True",
                ),
                rule(
                    r#"(?i)\b(password|passwd|api_key|secret|token)\s*=\s*["']"#,
                    "AEG-SECRET-LITERAL",
                    Severity::Medium,
                    "hardcoded credential",
                ),
                rule(
                    r"\brandom\.(random|randint|choice)\s*\(",
                    "AEG-RAND-WEAK",
                    Severity::Low,
                    "non-cryptographic randomness",
                ),
                rule(
                    r"(?m)^\s*assert\b",
                    "AEG-ASSERT",
                    Severity::Low,
                    "assert stripped under optimization",
                ),
            ],
        }
    }

    fn line_of(code: &str, byte_offset: usize) -> u64 {
        code[..byte_offset].bytes().filter(|b| *b == b'\n').count() as u64 + 1
    }
}

impl Default for PatternSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RiskSignal for PatternSignal {
    fn name(&self) -> &str {
        "pattern"
    }

    async fn evaluate(&self, code: &str) -> Result<SignalReport, SignalError> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            if let Some(m) = rule.pattern.find(code) {
                findings.push(Finding {
                    category: rule.category.to_string(),
                    severity: rule.severity,
                    description: rule.description.to_string(),
                    line: Some(Self::line_of(code, m.start())),
                });
            }
        }
        Ok(SignalReport {
            findings,
            parse_ok: true,
        })
    }
}
