//! Types for transfers and their progress.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Which way a file moves relative to the local staging directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    Upload,
    Download,
}

impl TransferDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferDirection::Upload => "upload",
            TransferDirection::Download => "download",
        }
    }
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One file move. The expected size is known before the move starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferTask {
    pub source_path: String,
    pub destination_path: String,
    pub expected_size_bytes: u64,
    pub owner_label: String,
    pub direction: TransferDirection,
}

/// One progress sample.
#[derive(Debug, Clone, Serialize)]
pub struct TransferProgress {
    pub destination_path: String,
    pub observed_bytes: u64,
    pub expected_bytes: u64,
    /// 0 until the destination is observable.
    pub percent: f64,
    pub elapsed: Duration,
    pub observed_at: DateTime<Utc>,
    /// The sample taken after the transfer finished.
    pub is_final: bool,
}

/// Computes progress as a percentage, capped at 100.
pub fn percent_of(observed: u64, expected: u64) -> f64 {
    if expected == 0 {
        return if observed > 0 { 100.0 } else { 0.0 };
    }
    (observed as f64 / expected as f64 * 100.0).min(100.0)
}

/// Outcome of a finished transfer.
#[derive(Debug, Clone)]
pub struct TransferResult {
    pub task: TransferTask,
    /// Destination size at the final sample.
    pub observed_bytes: u64,
    pub final_percent: f64,
    pub elapsed: Duration,
    /// Every sample in order, the final one last.
    pub samples: Vec<TransferProgress>,
}

impl TransferResult {
    /// Percentages of the samples taken while the transfer was running.
    pub fn intermediate_percents(&self) -> Vec<f64> {
        self.samples
            .iter()
            .filter(|s| !s.is_final)
            .map(|s| s.percent)
            .collect()
    }
}
