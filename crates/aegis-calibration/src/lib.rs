//! Aegis Calibration - split conformal threshold estimation
//!
//! One-shot batch procedure: load a sample set, mix in synthetic
//! known-risky samples so the score distribution has high-score mass,
//! score everything, and take the conformal quantile as the acceptance
//! threshold q̂. Calibration failures are fatal to the run; a wrong
//! threshold persisted silently would be worse than a loud abort, so no
//! partial record is ever written.

#![deny(unsafe_code)]

mod conformal;
mod error;
mod runner;
mod source;

pub use conformal::ConformalCalibrator;
pub use error::CalibrationError;
pub use runner::{CalibrationConfig, CalibrationRun};
pub use source::{
    inject_synthetic, JsonlSampleSource, SampleSource, StaticSampleSource,
    SYNTHETIC_RISK_PATTERNS,
};
