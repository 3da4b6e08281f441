//! Adapter over the in-memory record store
//!
//! Resolves a condition snapshot from per-patient metrics, taking the
//! most recent sample at or before the scoring time within a lookback
//! window.

use std::sync::Arc;
use std::time::Duration;

use super::{AdapterError, DatasetAdapter};
use crate::sofa::{Catecholamine, CatecholamineAgent, Condition};
use crate::storage::{Record, StorageEngine};

// Canonical measurement names, second half of "{patient_id}|{measurement}"
pub const MEAN_ARTERIAL_PRESSURE: &str = "mean_arterial_pressure";
pub const SYSTOLIC_BLOOD_PRESSURE: &str = "systolic_blood_pressure";
pub const DIASTOLIC_BLOOD_PRESSURE: &str = "diastolic_blood_pressure";
pub const PLATELETS: &str = "platelets";
pub const CREATININE: &str = "creatinine";
pub const BILIRUBIN: &str = "bilirubin";
pub const GLASGOW_COMA_SCALE: &str = "glasgow_coma_scale";
pub const PAO2: &str = "pao2";
pub const MECHANICAL_VENTILATION: &str = "mechanical_ventilation";

pub fn metric_name(patient_id: &str, measurement: &str) -> String {
    format!("{}|{}", patient_id, measurement)
}

pub fn medication_metric(patient_id: &str, agent: CatecholamineAgent) -> String {
    format!("{}|catecholamine|{}", patient_id, agent.as_str())
}

/// Resolves condition snapshots from the record store.
///
/// The six numeric measurements are required; a patient with no sample
/// of one of them inside the lookback window cannot be scored.
/// Catecholamine therapy and the ventilation flag are optional: with no
/// administration or flag on record the snapshot assumes none, so the
/// resulting score is a lower bound on the patient's severity.
///
/// Platelets are expected in K/µL as charted by lab systems and scaled
/// to count/µL here.
pub struct RecordStoreAdapter {
    storage: Arc<StorageEngine>,
    lookback: Duration,
}

impl RecordStoreAdapter {
    pub fn new(storage: Arc<StorageEngine>, lookback: Duration) -> Self {
        RecordStoreAdapter { storage, lookback }
    }

    /// Most recent record for a metric at or before `time`.
    fn latest_record(&self, metric: &str, time: i64) -> Result<Option<Record>, AdapterError> {
        let start = time - self.lookback.as_secs() as i64;
        let records = self.storage.query_range(start, time + 1, metric)?;
        Ok(records.into_iter().max_by_key(|r| r.timestamp))
    }

    fn latest_sample(
        &self,
        patient_id: &str,
        measurement: &'static str,
        time: i64,
    ) -> Result<Option<f64>, AdapterError> {
        let record = self.latest_record(&metric_name(patient_id, measurement), time)?;
        Ok(record.map(|r| r.value))
    }

    fn required_sample(
        &self,
        patient_id: &str,
        measurement: &'static str,
        time: i64,
    ) -> Result<f64, AdapterError> {
        self.latest_sample(patient_id, measurement, time)?
            .ok_or_else(|| AdapterError::MissingMeasurement {
                patient_id: patient_id.to_string(),
                measurement,
            })
    }

    /// MAP as charted, or derived from systolic and diastolic pressure
    /// when no direct reading exists.
    fn mean_arterial_pressure(&self, patient_id: &str, time: i64) -> Result<f64, AdapterError> {
        if let Some(pressure) = self.latest_sample(patient_id, MEAN_ARTERIAL_PRESSURE, time)? {
            return Ok(pressure);
        }

        let systolic = self.latest_sample(patient_id, SYSTOLIC_BLOOD_PRESSURE, time)?;
        let diastolic = self.latest_sample(patient_id, DIASTOLIC_BLOOD_PRESSURE, time)?;
        match (systolic, diastolic) {
            (Some(systolic), Some(diastolic)) => Ok(systolic + 2.0 / 3.0 * diastolic),
            _ => Err(AdapterError::MissingMeasurement {
                patient_id: patient_id.to_string(),
                measurement: MEAN_ARTERIAL_PRESSURE,
            }),
        }
    }

    /// Most recent administration among the recognized agents, if any.
    fn catecholamine(&self, patient_id: &str, time: i64) -> Result<Option<Catecholamine>, AdapterError> {
        let agents = [
            CatecholamineAgent::Dopamine,
            CatecholamineAgent::Dobutamine,
            CatecholamineAgent::Epinephrine,
            CatecholamineAgent::Norepinephrine,
        ];

        let mut latest: Option<(i64, Catecholamine)> = None;
        for agent in agents {
            if let Some(record) = self.latest_record(&medication_metric(patient_id, agent), time)? {
                let candidate = (
                    record.timestamp,
                    Catecholamine {
                        agent,
                        dosage: record.value,
                    },
                );
                if latest.map_or(true, |(timestamp, _)| record.timestamp > timestamp) {
                    latest = Some(candidate);
                }
            }
        }

        Ok(latest.map(|(_, catecholamine)| catecholamine))
    }

    fn is_ventilated(&self, patient_id: &str, time: i64) -> Result<bool, AdapterError> {
        let flag = self.latest_sample(patient_id, MECHANICAL_VENTILATION, time)?;
        Ok(flag.map_or(false, |value| value != 0.0))
    }
}

impl DatasetAdapter for RecordStoreAdapter {
    fn condition(&self, patient_id: &str, time: i64) -> Result<Condition, AdapterError> {
        let mean_arterial_pressure = self.mean_arterial_pressure(patient_id, time)?;
        let catecholamine = self.catecholamine(patient_id, time)?;
        let platelets = self.required_sample(patient_id, PLATELETS, time)?;
        let creatinine_level = self.required_sample(patient_id, CREATININE, time)?;
        let bilirubin_level = self.required_sample(patient_id, BILIRUBIN, time)?;
        let glasgow_coma_scale = self.required_sample(patient_id, GLASGOW_COMA_SCALE, time)?;
        let partial_pressure_of_oxygen = self.required_sample(patient_id, PAO2, time)?;
        let is_mechanically_ventilated = self.is_ventilated(patient_id, time)?;

        Ok(Condition {
            mean_arterial_pressure,
            catecholamine,
            platelets_count: (platelets * 1_000.0) as u32,
            creatinine_level,
            bilirubin_level,
            glasgow_coma_scale: glasgow_coma_scale.round() as u8,
            partial_pressure_of_oxygen,
            is_mechanically_ventilated,
        })
    }
}
