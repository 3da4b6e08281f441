use super::Record;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, PartialEq, Eq)]
pub enum ChunkError {
    TimestampOutOfRange { timestamp: i64, start: i64, end: i64 },
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::TimestampOutOfRange { timestamp, start, end } => write!(
                f,
                "Timestamp {} outside chunk range [{}, {})",
                timestamp, start, end
            ),
        }
    }
}

impl std::error::Error for ChunkError {}

/// One fixed time interval's worth of records.
#[derive(Debug)]
pub struct TimeChunk {
    start_time: i64,
    end_time: i64,
    // Group records by metric name for faster access
    records: HashMap<String, Vec<Record>>,
}

impl TimeChunk {
    pub fn new(start_time: i64, end_time: i64) -> Self {
        TimeChunk {
            start_time,
            end_time,
            records: HashMap::new(),
        }
    }

    pub fn append(&mut self, record: Record) -> Result<(), ChunkError> {
        if record.timestamp < self.start_time || record.timestamp >= self.end_time {
            return Err(ChunkError::TimestampOutOfRange {
                timestamp: record.timestamp,
                start: self.start_time,
                end: self.end_time,
            });
        }

        self.records
            .entry(record.metric_name.clone())
            .or_insert_with(Vec::new)
            .push(record);

        Ok(())
    }

    /// Records for a metric with timestamps in [start, end).
    pub fn get_range(&self, start: i64, end: i64, metric: &str) -> Vec<&Record> {
        self.records
            .get(metric)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.timestamp >= start && r.timestamp < end)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Most recent record for a metric within this chunk.
    pub fn get_latest(&self, metric: &str) -> Option<&Record> {
        self.records
            .get(metric)?
            .iter()
            .max_by_key(|r| r.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(timestamp: i64, value: f64) -> Record {
        Record {
            timestamp,
            metric_name: "p1|platelets".to_string(),
            value,
        }
    }

    #[test]
    fn append_rejects_out_of_range_timestamps() {
        let mut chunk = TimeChunk::new(0, 3600);
        assert!(chunk.append(record(100, 1.0)).is_ok());
        assert!(chunk.append(record(3600, 1.0)).is_err());
        assert!(chunk.append(record(-1, 1.0)).is_err());
    }

    #[test]
    fn latest_picks_newest_record() {
        let mut chunk = TimeChunk::new(0, 3600);
        chunk.append(record(100, 1.0)).unwrap();
        chunk.append(record(200, 2.0)).unwrap();
        chunk.append(record(150, 3.0)).unwrap();

        let latest = chunk.get_latest("p1|platelets").unwrap();
        assert_eq!(latest.timestamp, 200);
        assert_eq!(latest.value, 2.0);
    }
}
