//! In-memory store for tests and ephemeral deployments.

use std::sync::RwLock;

use aegis_types::CalibrationRecord;

use crate::{StoreResult, ThresholdStore};

/// Threshold store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryThresholdStore {
    record: RwLock<Option<CalibrationRecord>>,
}

impl MemoryThresholdStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded store.
    pub fn with_record(record: CalibrationRecord) -> Self {
        Self {
            record: RwLock::new(Some(record)),
        }
    }
}

impl ThresholdStore for MemoryThresholdStore {
    fn load(&self) -> StoreResult<Option<CalibrationRecord>> {
        Ok(self
            .record
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, record: &CalibrationRecord) -> StoreResult<()> {
        *self
            .record
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(record.clone());
        Ok(())
    }
}
