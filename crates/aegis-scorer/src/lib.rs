//! Aegis Scorer - fail-closed non-conformity scoring
//!
//! Maps a code string to a deterministic score in [0.0, 1.0] using a
//! pluggable risk signal. Every failure path (signal missing, timeout,
//! unparseable sample, undecodable output) is absorbed into the maximal
//! score rather than raised: unknown or unscannable code is never
//! trusted.

#![deny(unsafe_code)]

mod bandit;
mod error;
mod pattern;
mod sanitize;
mod scorer;
mod signal;

pub use bandit::{BanditConfig, BanditSignal};
pub use error::SignalError;
pub use pattern::PatternSignal;
pub use sanitize::CodeSanitizer;
pub use scorer::{ScoreFailure, ScoreOutcome, Scorer};
pub use signal::RiskSignal;
