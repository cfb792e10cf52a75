//! Scheduler configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for placement and drain detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Per-node concurrency cap. Admission is inclusive: a node reporting
    /// exactly this many running jobs still receives one more.
    #[serde(default = "default_max_jobs")]
    pub max_jobs_per_node: usize,

    /// Pause after each submission so the remote job shows up in the
    /// next process listing (milliseconds).
    #[serde(default = "default_admission_delay")]
    pub admission_delay_ms: u64,

    /// How often the completion barrier polls the pool (milliseconds).
    #[serde(default = "default_drain_interval")]
    pub drain_interval_ms: u64,

    /// Give up placing a job after this long without headroom anywhere.
    /// Unset means wait forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_placement_wait_secs: Option<u64>,
}

fn default_max_jobs() -> usize {
    6
}

fn default_admission_delay() -> u64 {
    5000 // 5 seconds
}

fn default_drain_interval() -> u64 {
    5000 // 5 seconds
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_jobs_per_node: default_max_jobs(),
            admission_delay_ms: default_admission_delay(),
            drain_interval_ms: default_drain_interval(),
            max_placement_wait_secs: None,
        }
    }
}

impl SchedulerConfig {
    pub fn with_max_jobs_per_node(mut self, cap: usize) -> Self {
        self.max_jobs_per_node = cap;
        self
    }

    pub fn with_max_placement_wait(mut self, secs: u64) -> Self {
        self.max_placement_wait_secs = Some(secs);
        self
    }

    pub fn admission_delay(&self) -> Duration {
        Duration::from_millis(self.admission_delay_ms)
    }

    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }

    pub fn max_placement_wait(&self) -> Option<Duration> {
        self.max_placement_wait_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_jobs_per_node, 6);
        assert_eq!(config.admission_delay(), Duration::from_secs(5));
        assert_eq!(config.drain_interval(), Duration::from_secs(5));
        assert!(config.max_placement_wait().is_none());
    }

    #[test]
    fn test_deserialize_with_wait() {
        let toml = r#"
            max_jobs_per_node = 2
            max_placement_wait_secs = 3600
        "#;
        let config: SchedulerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_jobs_per_node, 2);
        assert_eq!(config.max_placement_wait(), Some(Duration::from_secs(3600)));
        assert_eq!(config.admission_delay_ms, 5000);
    }
}
