//! Aegis Loop - bounded correction loop
//!
//! Wraps an external code generator and the verification gate: generate
//! a candidate, verify it, and on rejection resubmit with structured
//! feedback, up to a fixed attempt cap. The loop is an explicit state
//! machine over a bounded counter, so termination in `Accepted` or
//! `Exhausted` is structural rather than incidental.

#![deny(unsafe_code)]

mod correction;
mod error;
mod feedback;
mod generator;

pub use correction::{
    AcceptedCode, Attempt, AttemptOutcome, CorrectionLoop, LoopConfig, LoopOutcome, LoopState,
};
pub use error::GeneratorError;
pub use feedback::RejectionFeedback;
pub use generator::{
    CodeGenerator, GenerationRequest, HttpGenerator, HttpGeneratorConfig, ScriptedGenerator,
};
