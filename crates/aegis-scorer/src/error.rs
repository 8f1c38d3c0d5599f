//! Error types for risk-signal evaluation.
//!
//! These never escape `Scorer::score`; they exist so signal
//! implementations can report distinct failure causes before the
//! fail-closed policy collapses them into a score of 1.0.

use thiserror::Error;

/// Failure of one risk-signal evaluation.
#[derive(Debug, Error)]
pub enum SignalError {
    /// The signal executable is not installed or not reachable.
    #[error("signal tool '{program}' not found")]
    ToolUnavailable { program: String },

    /// The signal did not finish within its deadline.
    #[error("signal timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Launching or driving the signal process failed.
    #[error("signal execution failed: {0}")]
    Io(#[from] std::io::Error),

    /// The signal produced output that could not be decoded.
    #[error("signal output could not be decoded: {0}")]
    Decode(String),
}
