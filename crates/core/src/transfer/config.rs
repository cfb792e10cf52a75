//! Transfer configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the transfer pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Local staging directory for downloaded and to-be-uploaded images.
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,

    /// How often the destination size is sampled (milliseconds).
    #[serde(default = "default_progress_interval")]
    pub progress_interval_ms: u64,

    /// Fail a finished transfer whose destination size differs from the source.
    #[serde(default = "default_verify_size")]
    pub verify_size: bool,

    /// Retry behavior for channel operations.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_local_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_progress_interval() -> u64 {
    5000 // 5 seconds
}

fn default_verify_size() -> bool {
    true
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            local_dir: default_local_dir(),
            progress_interval_ms: default_progress_interval(),
            verify_size: default_verify_size(),
            retry: RetryConfig::default(),
        }
    }
}

impl TransferConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn with_local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = dir.into();
        self
    }
}

/// Retry settings shared by probes and transfer bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts (milliseconds).
    #[serde(default = "default_retry_delay")]
    pub delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    5000 // 5 seconds
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_retry_delay(),
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransferConfig::default();
        assert_eq!(config.progress_interval(), Duration::from_secs(5));
        assert!(config.verify_size);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_deserialize_nested_retry() {
        let toml = r#"
            local_dir = "/data/images"

            [retry]
            max_retries = 5
        "#;
        let config: TransferConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.local_dir, PathBuf::from("/data/images"));
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.delay_ms, 5000);
    }
}
