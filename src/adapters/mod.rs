//! Dataset adapters
//!
//! Bridges external clinical datasets and the scoring core:
//! - `DatasetAdapter` capability trait (condition lookup + score shortcut)
//! - Adapter backed by the in-memory record store
//!
//! Adapters own all data-retrieval concerns. The scoring core only ever
//! sees a fully materialized `Condition` snapshot.

pub mod record_store;
pub use record_store::RecordStoreAdapter;

use std::fmt;
use crate::sofa::{self, Condition};
use crate::storage::StorageError;

#[derive(Debug)]
pub enum AdapterError {
    MissingMeasurement {
        patient_id: String,
        measurement: &'static str,
    },
    Storage(StorageError),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::MissingMeasurement { patient_id, measurement } => write!(
                f,
                "No {} recorded for patient {} in the lookback window",
                measurement, patient_id
            ),
            AdapterError::Storage(err) => write!(f, "Storage error: {}", err),
        }
    }
}

impl std::error::Error for AdapterError {}

impl From<StorageError> for AdapterError {
    fn from(error: StorageError) -> Self {
        AdapterError::Storage(error)
    }
}

/// A per-dataset source of condition snapshots.
///
/// Implementors only need `condition`; any type producing a well-formed
/// snapshot for a patient at a point in time can be scored. Retrieval
/// failures surface as errors, never as zeroed snapshots.
pub trait DatasetAdapter {
    /// Determine the condition for a patient at a given time
    /// (epoch seconds).
    fn condition(&self, patient_id: &str, time: i64) -> Result<Condition, AdapterError>;

    /// Computes the SOFA score based on the patient's condition.
    fn compute_sofa_score(&self, patient_id: &str, time: i64) -> Result<u8, AdapterError> {
        Ok(sofa::compute(self.condition(patient_id, time)?))
    }
}
