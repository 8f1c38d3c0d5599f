//! JSON file store.

use std::path::{Path, PathBuf};

use aegis_types::CalibrationRecord;

use crate::{StoreError, StoreResult, ThresholdStore};

/// Calibration record stored as a single JSON file.
///
/// Saves write to a sibling temp file and rename into place, so a
/// reader never observes a half-written record.
#[derive(Clone, Debug)]
pub struct JsonThresholdStore {
    path: PathBuf,
}

impl JsonThresholdStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ThresholdStore for JsonThresholdStore {
    fn load(&self) -> StoreResult<Option<CalibrationRecord>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: CalibrationRecord =
            serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                path: self.path.display().to_string(),
                detail: e.to_string(),
            })?;

        Ok(Some(record))
    }

    fn save(&self, record: &CalibrationRecord) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, json)?;
        std::fs::rename(&staging, &self.path)?;

        tracing::info!(path = %self.path.display(), q_hat = record.q_hat, "calibration record saved");
        Ok(())
    }
}
