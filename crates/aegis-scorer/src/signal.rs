use aegis_types::SignalReport;
use async_trait::async_trait;

use crate::error::SignalError;

/// A risk signal evaluates one self-contained code unit and reports the
/// issues it found, plus whether the unit parsed as valid code.
///
/// Implementations must be deterministic (identical input, identical
/// report for a fixed signal version) and safe to call concurrently.
/// Alternative signals (pattern scanners, secret detectors) implement
/// this trait and slot in without changes to the gate or calibrator.
#[async_trait]
pub trait RiskSignal: Send + Sync {
    /// Short stable name of this signal, recorded in calibration
    /// metadata.
    fn name(&self) -> &str;

    /// Evaluate the (already sanitized) code unit.
    async fn evaluate(&self, code: &str) -> Result<SignalReport, SignalError>;
}
