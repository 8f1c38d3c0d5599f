use thiserror::Error;

/// Calibration failures. All fatal to the run.
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("alpha must be in (0, 1), got {0}")]
    InvalidAlpha(f64),

    #[error("insufficient samples: required {required}, available {available}")]
    InsufficientSamples { required: usize, available: usize },

    #[error("failed to load dataset '{dataset}': {detail}")]
    DatasetLoad { dataset: String, detail: String },

    #[error("failed to persist calibration record: {0}")]
    Store(#[from] aegis_store::StoreError),
}
