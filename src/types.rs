use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::compressor::Algorithm;

/// One day of health metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub timestamp: NaiveDate,
    pub heart_rate: f64,
    pub steps: u32,
    pub sleep_hours: f64,
    pub calories: u32,
}

/// A user's records, kept in ascending timestamp order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<HealthRecord>", into = "Vec<HealthRecord>")]
pub struct HealthHistory {
    records: Vec<HealthRecord>,
}

impl HealthHistory {
    /// Builds a history from records in any order. Records sharing a
    /// timestamp keep the order they were given in.
    pub fn new(mut records: Vec<HealthRecord>) -> Self {
        records.sort_by_key(|r| r.timestamp);
        Self { records }
    }

    pub fn push(&mut self, record: HealthRecord) {
        let at = self
            .records
            .partition_point(|r| r.timestamp <= record.timestamp);
        self.records.insert(at, record);
    }

    pub fn records(&self) -> &[HealthRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HealthRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<HealthRecord> {
        self.records
    }
}

impl From<Vec<HealthRecord>> for HealthHistory {
    fn from(records: Vec<HealthRecord>) -> Self {
        Self::new(records)
    }
}

impl From<HealthHistory> for Vec<HealthRecord> {
    fn from(history: HealthHistory) -> Self {
        history.records
    }
}

impl FromIterator<HealthRecord> for HealthHistory {
    fn from_iter<I: IntoIterator<Item = HealthRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a HealthHistory {
    type Item = &'a HealthRecord;
    type IntoIter = std::slice::Iter<'a, HealthRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Outcome of one compression request. Failures are reported through
/// `success` and `error`, never by returning an `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionReport {
    pub success: bool,
    pub user_id: String,
    pub original_size_bytes: u64,
    pub compressed_size_bytes: u64,
    /// `1 - compressed / original`, or 0 when nothing was serialized.
    /// Drops below zero when container overhead outweighs the savings
    /// on very small inputs.
    pub compression_ratio: f64,
    #[serde(default)]
    pub record_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CompressionReport {
    pub fn measured(
        user_id: &str,
        original_size: usize,
        compressed_size: usize,
        record_count: usize,
        digest: String,
    ) -> Self {
        let compression_ratio = if original_size == 0 {
            0.0
        } else {
            1.0 - compressed_size as f64 / original_size as f64
        };

        Self {
            success: true,
            user_id: user_id.to_string(),
            original_size_bytes: original_size as u64,
            compressed_size_bytes: compressed_size as u64,
            compression_ratio,
            record_count,
            digest: Some(digest),
            error: None,
        }
    }

    pub fn failure(user_id: &str, error: impl fmt::Display) -> Self {
        Self {
            success: false,
            user_id: user_id.to_string(),
            original_size_bytes: 0,
            compressed_size_bytes: 0,
            compression_ratio: 0.0,
            record_count: 0,
            digest: None,
            error: Some(error.to_string()),
        }
    }

    pub fn original_size_kib(&self) -> f64 {
        self.original_size_bytes as f64 / 1024.0
    }

    pub fn compressed_size_kib(&self) -> f64 {
        self.compressed_size_bytes as f64 / 1024.0
    }

    pub fn savings_percent(&self) -> f64 {
        self.compression_ratio * 100.0
    }
}

impl fmt::Display for CompressionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "{}: failed ({})", self.user_id, error),
            None => write!(
                f,
                "{}: {:.2} KiB -> {:.2} KiB ({:.1}% saved)",
                self.user_id,
                self.original_size_kib(),
                self.compressed_size_kib(),
                self.savings_percent()
            ),
        }
    }
}

/// Metadata about a compressed history archive
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveMetadata {
    pub version: u8,
    pub algorithm: Algorithm,
    pub level: u32,
    pub record_count: u32,
    pub raw_size: usize,
    pub compressed_size: usize,
    pub raw_checksum: u32,
    pub overall_checksum: u32,
    pub digest: String,
}
