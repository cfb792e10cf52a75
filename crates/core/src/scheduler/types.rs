//! Types produced by a scheduling wave.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::pool::Job;

/// One successful placement.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementRecord {
    pub job: Job,
    /// Address of the node that received the job.
    pub node: String,
    /// Running-job count observed on the node right before submission.
    pub observed_count: usize,
    pub placed_at: DateTime<Utc>,
}

/// Outcome of a drain wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    /// Number of pool-wide polls, including the one that saw zero.
    pub polls: u32,
    pub waited: Duration,
}

/// Outcome of a full wave: placement followed by drain.
#[derive(Debug, Clone)]
pub struct WaveReport {
    pub wave_id: Uuid,
    pub placements: Vec<PlacementRecord>,
    pub drain: DrainReport,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl WaveReport {
    /// Number of jobs each node received, in placement order of first use.
    pub fn jobs_per_node(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for record in &self.placements {
            match counts.iter_mut().find(|(node, _)| *node == record.node) {
                Some((_, n)) => *n += 1,
                None => counts.push((record.node.clone(), 1)),
            }
        }
        counts
    }
}
