//! Structured rejection feedback.
//!
//! Only the numeric score, the numeric threshold, and a signal rule id
//! ever reach the generator, rendered through a fixed template. Raw
//! decision text, user text, or generated code is never reinjected, so
//! the feedback channel cannot carry instructions back into the
//! generator.

use aegis_gate::Verdict;
use serde::{Deserialize, Serialize};

/// Sanitized summary of a rejection, sent to the generator on retry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RejectionFeedback {
    pub score: f64,
    pub threshold: f64,
    /// Rule id of the worst finding, when the signal reported one.
    pub category: Option<String>,
}

impl RejectionFeedback {
    pub fn from_verdict(verdict: &Verdict) -> Self {
        Self {
            score: verdict.decision.score,
            threshold: verdict.decision.threshold,
            category: verdict.worst_category().map(str::to_string),
        }
    }

    /// Render the fixed feedback template.
    pub fn render(&self) -> String {
        let mut text = format!(
            "The previous candidate was rejected by the security gate: \
             risk score {:.4} exceeded the acceptance threshold {:.4}.",
            self.score, self.threshold
        );
        if let Some(category) = &self.category {
            text.push_str(&format!(" Flagged rule: {category}."));
        }
        text.push_str(" Rewrite the code to avoid the flagged behavior using safe, standard constructs.");
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_mentions_score_threshold_and_category() {
        let feedback = RejectionFeedback {
            score: 1.0,
            threshold: 0.15,
            category: Some("AEG-EXEC-EVAL".into()),
        };
        let text = feedback.render();
        assert!(text.contains("1.0000"));
        assert!(text.contains("0.1500"));
        assert!(text.contains("AEG-EXEC-EVAL"));
    }

    #[test]
    fn render_without_category_omits_the_rule_line() {
        let feedback = RejectionFeedback {
            score: 1.0,
            threshold: 0.15,
            category: None,
        };
        assert!(!feedback.render().contains("Flagged rule"));
    }
}
