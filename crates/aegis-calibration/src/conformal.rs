//! Split conformal quantile estimation.
//!
//! Given calibration scores {s_1..s_n} and risk tolerance α, the
//! threshold is the rank-th smallest score with
//! `rank = ceil((n+1)(1-α))`. A fresh exchangeable sample then exceeds
//! q̂ with probability at most α, with no distributional assumptions.
//! When the rank lands on n the finite quantile does not exist and the
//! threshold degrades to the maximum possible score, i.e. no effective
//! rejection at that α.

use crate::error::CalibrationError;

/// Maximum possible non-conformity score, used as the
/// "accept everything" sentinel when no finite quantile exists.
const MAX_SCORE: f64 = 1.0;

/// Computes the conformal threshold from a score set.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConformalCalibrator;

impl ConformalCalibrator {
    pub fn new() -> Self {
        Self
    }

    /// Smallest sample count for which the scheme is meaningful
    /// (`n >= 1/α - 1`, and never fewer than 2).
    pub fn min_samples(alpha: f64) -> usize {
        ((1.0 / alpha - 1.0).ceil() as usize).max(2)
    }

    /// Compute q̂ from non-conformity scores.
    pub fn threshold(&self, scores: &[f64], alpha: f64) -> Result<f64, CalibrationError> {
        if !alpha.is_finite() || alpha <= 0.0 || alpha >= 1.0 {
            return Err(CalibrationError::InvalidAlpha(alpha));
        }

        let n = scores.len();
        let required = Self::min_samples(alpha);
        if n < required {
            return Err(CalibrationError::InsufficientSamples {
                required,
                available: n,
            });
        }

        let mut sorted = scores.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let rank = (((n as f64 + 1.0) * (1.0 - alpha)).ceil() as usize).clamp(1, n);

        let q_hat = if rank == n {
            MAX_SCORE
        } else {
            sorted[rank - 1]
        };

        tracing::info!(n, alpha, rank, q_hat, "conformal threshold computed");
        Ok(q_hat)
    }
}
