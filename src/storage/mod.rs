//! Core storage engine
//!
//! In-memory time-series store for clinical measurements:
//! - Records bucketed into fixed-duration time chunks
//! - Range and latest-value queries per metric
//!
//! Metric names follow the `"{patient_id}|{measurement}"` convention used
//! throughout the adapter layer.

mod chunk;
pub use chunk::{TimeChunk, ChunkError};

use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use std::time::Duration;
use crate::config::Config;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: i64,
    pub metric_name: String,
    pub value: f64,
}

#[derive(Debug)]
pub enum StorageError {
    ChunkError(ChunkError),
    InvalidTimeRange(String),
    MetricNotFound(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ChunkError(err) => write!(f, "Chunk error: {}", err),
            StorageError::InvalidTimeRange(msg) => write!(f, "Invalid time range: {}", msg),
            StorageError::MetricNotFound(msg) => write!(f, "Metric not found: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<ChunkError> for StorageError {
    fn from(error: ChunkError) -> Self {
        StorageError::ChunkError(error)
    }
}

#[derive(Debug)]
pub struct StorageEngine {
    chunks: RwLock<HashMap<i64, TimeChunk>>,
    chunk_duration: Duration,
}

impl StorageEngine {
    pub fn new(config: &Config) -> Self {
        StorageEngine {
            chunks: RwLock::new(HashMap::new()),
            chunk_duration: config.storage.chunk_duration(),
        }
    }

    pub fn insert(&self, record: Record) -> Result<(), StorageError> {
        let chunk_id = self.get_chunk_id(record.timestamp);
        let mut chunks = self.chunks.write().unwrap();

        let end_time = chunk_id + self.chunk_duration.as_secs() as i64;
        chunks
            .entry(chunk_id)
            .or_insert_with(|| TimeChunk::new(chunk_id, end_time))
            .append(record)
            .map_err(StorageError::from)
    }

    /// All records for a metric with timestamps in [start, end).
    pub fn query_range(&self, start: i64, end: i64, metric: &str) -> Result<Vec<Record>, StorageError> {
        if start >= end {
            return Err(StorageError::InvalidTimeRange(
                "Start time must be before end time".to_string(),
            ));
        }

        let chunks = self.chunks.read().unwrap();
        let mut results = Vec::new();

        let start_chunk = self.get_chunk_id(start);
        let end_chunk = self.get_chunk_id(end);

        for chunk_id in (start_chunk..=end_chunk).step_by(self.chunk_duration.as_secs() as usize) {
            if let Some(chunk) = chunks.get(&chunk_id) {
                results.extend(chunk.get_range(start, end, metric).into_iter().cloned());
            }
        }

        Ok(results)
    }

    /// Most recent record for a metric across all chunks.
    pub fn get_latest(&self, metric: &str) -> Result<Record, StorageError> {
        let chunks = self.chunks.read().unwrap();
        let latest = chunks
            .values()
            .filter_map(|chunk| chunk.get_latest(metric))
            .max_by_key(|record| record.timestamp);

        latest
            .cloned()
            .ok_or_else(|| StorageError::MetricNotFound(format!("No data found for {}", metric)))
    }

    fn get_chunk_id(&self, timestamp: i64) -> i64 {
        timestamp - (timestamp % self.chunk_duration.as_secs() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(timestamp: i64, metric: &str, value: f64) -> Record {
        Record {
            timestamp,
            metric_name: metric.to_string(),
            value,
        }
    }

    #[test]
    fn insert_and_query_latest() {
        let storage = StorageEngine::new(&Config::default());

        storage.insert(record(1000, "p1|creatinine", 1.4)).unwrap();
        storage.insert(record(2000, "p1|creatinine", 2.1)).unwrap();

        let latest = storage.get_latest("p1|creatinine").unwrap();
        assert_eq!(latest.timestamp, 2000);
        assert_eq!(latest.value, 2.1);
    }

    #[test]
    fn query_range_spans_chunks() {
        let storage = StorageEngine::new(&Config::default());

        // One record per hour chunk plus one outside the queried range
        storage.insert(record(1000, "p1|pao2", 410.0)).unwrap();
        storage.insert(record(4000, "p1|pao2", 380.0)).unwrap();
        storage.insert(record(9000, "p1|pao2", 150.0)).unwrap();

        let records = storage.query_range(0, 7200, "p1|pao2").unwrap();
        let mut timestamps: Vec<i64> = records.iter().map(|r| r.timestamp).collect();
        timestamps.sort();
        assert_eq!(timestamps, vec![1000, 4000]);
    }

    #[test]
    fn query_range_rejects_inverted_ranges() {
        let storage = StorageEngine::new(&Config::default());
        assert!(storage.query_range(2000, 1000, "p1|pao2").is_err());
    }

    #[test]
    fn latest_of_unknown_metric_is_an_error() {
        let storage = StorageEngine::new(&Config::default());
        assert!(matches!(
            storage.get_latest("p9|bilirubin"),
            Err(StorageError::MetricNotFound(_))
        ));
    }
}
