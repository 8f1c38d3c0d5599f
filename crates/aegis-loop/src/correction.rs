//! The correction loop state machine.

use std::sync::Arc;
use std::time::Duration;

use aegis_gate::Commander;
use aegis_types::Decision;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GeneratorError;
use crate::feedback::RejectionFeedback;
use crate::generator::{CodeGenerator, GenerationRequest};

/// Loop states. `Accepted` and `Exhausted` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    Generating,
    Verifying,
    Accepted,
    Exhausted,
}

/// One iteration of the loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based attempt number.
    pub number: u32,
    /// Feedback forwarded to the generator for this attempt (None on
    /// the first attempt).
    pub feedback_sent: Option<RejectionFeedback>,
    pub outcome: AttemptOutcome,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// The candidate reached the gate.
    Verified { code: String, decision: Decision },
    /// The generator failed or timed out; the attempt is consumed.
    GeneratorFailed { error: String },
}

/// Loop parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoopConfig {
    pub max_attempts: u32,
    /// Deadline for one generator call. Enforced by the loop, so it
    /// holds for any generator implementation.
    pub generator_timeout_secs: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            generator_timeout_secs: 60,
        }
    }
}

/// Code that passed the gate, with its decision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcceptedCode {
    pub code: String,
    pub decision: Decision,
}

/// Terminal result of one loop run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoopOutcome {
    pub request_id: Uuid,
    /// Terminal state: `Accepted` or `Exhausted`.
    pub state: LoopState,
    pub attempts: Vec<Attempt>,
    /// Set only in the `Accepted` state.
    pub accepted: Option<AcceptedCode>,
}

impl LoopOutcome {
    pub fn is_accepted(&self) -> bool {
        self.state == LoopState::Accepted
    }
}

/// Orchestrates bounded generate/verify retries for one user request.
///
/// Each run owns its attempt sequence; independent runs share nothing
/// and may execute fully in parallel.
pub struct CorrectionLoop {
    generator: Arc<dyn CodeGenerator>,
    commander: Arc<Commander>,
    config: LoopConfig,
}

impl CorrectionLoop {
    pub fn new(
        generator: Arc<dyn CodeGenerator>,
        commander: Arc<Commander>,
        config: LoopConfig,
    ) -> Self {
        Self {
            generator,
            commander,
            config,
        }
    }

    /// Run the loop for one request.
    ///
    /// The `for` over the attempt counter is the termination guarantee:
    /// the generator is invoked at most `max_attempts` times, and the
    /// run always ends in `Accepted` or `Exhausted`.
    pub async fn run(&self, prompt: &str) -> LoopOutcome {
        let request_id = Uuid::new_v4();
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut feedback: Option<RejectionFeedback> = None;

        for number in 1..=self.config.max_attempts {
            tracing::info!(
                %request_id,
                attempt = number,
                max = self.config.max_attempts,
                state = ?LoopState::Generating,
                "generating candidate"
            );

            let request = GenerationRequest {
                prompt: prompt.to_string(),
                feedback: feedback.clone(),
            };

            let generated = tokio::time::timeout(
                Duration::from_secs(self.config.generator_timeout_secs),
                self.generator.generate(&request),
            )
            .await
            .unwrap_or(Err(GeneratorError::Timeout));

            let code = match generated {
                Ok(code) => code,
                Err(e) => {
                    tracing::warn!(%request_id, attempt = number, error = %e, "generator failed; attempt consumed");
                    attempts.push(Attempt {
                        number,
                        feedback_sent: feedback.clone(),
                        outcome: AttemptOutcome::GeneratorFailed {
                            error: e.to_string(),
                        },
                    });
                    // Feedback from the last rejection stays pending for
                    // the next attempt.
                    continue;
                }
            };

            tracing::info!(%request_id, attempt = number, state = ?LoopState::Verifying, "verifying candidate");
            let verdict = self.commander.verify_detailed(&code).await;
            let decision = verdict.decision.clone();

            attempts.push(Attempt {
                number,
                feedback_sent: feedback.clone(),
                outcome: AttemptOutcome::Verified {
                    code: code.clone(),
                    decision: decision.clone(),
                },
            });

            if decision.passed() {
                tracing::info!(%request_id, attempt = number, score = decision.score, "candidate accepted");
                return LoopOutcome {
                    request_id,
                    state: LoopState::Accepted,
                    attempts,
                    accepted: Some(AcceptedCode { code, decision }),
                };
            }

            feedback = Some(RejectionFeedback::from_verdict(&verdict));
        }

        tracing::warn!(
            %request_id,
            attempts = attempts.len(),
            "attempts exhausted; no code accepted"
        );
        LoopOutcome {
            request_id,
            state: LoopState::Exhausted,
            attempts,
            accepted: None,
        }
    }
}
