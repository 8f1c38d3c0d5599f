//! Aegis Store - durable calibration records
//!
//! The calibrator writes one [`CalibrationRecord`] per run; the gate
//! loads it at startup. A store that cannot produce a record is a
//! recoverable condition for the gate (it falls back to the default
//! threshold) but corrupt data is still surfaced distinctly so it can
//! be logged.

#![deny(unsafe_code)]

mod json;
mod memory;

use aegis_types::CalibrationRecord;
use thiserror::Error;

pub use json::JsonThresholdStore;
pub use memory::MemoryThresholdStore;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("calibration record corrupt at {path}: {detail}")]
    Corrupt { path: String, detail: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage interface for the calibrated threshold record.
pub trait ThresholdStore: Send + Sync {
    /// Load the current record. `Ok(None)` when none has been saved.
    fn load(&self) -> StoreResult<Option<CalibrationRecord>>;

    /// Replace the current record atomically.
    fn save(&self, record: &CalibrationRecord) -> StoreResult<()>;
}
