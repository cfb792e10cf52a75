use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::channel::SftpConfig;
use crate::directory::ClusterConfig;
use crate::disk::DiskConfig;
use crate::pool::{ConversionConfig, WorkerConfig};
use crate::scheduler::SchedulerConfig;
use crate::transfer::TransferConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub channel: SftpConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub disks: DiskConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// A credential that never shows up in logs.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw value, for handing to the process that needs it.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

/// Metrics output configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Write the metrics text exposition here after every command
    /// (node-exporter textfile collector).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textfile_path: Option<PathBuf>,
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub conversion: ConversionConfig,
    pub cluster: SanitizedClusterConfig,
    pub workers: SanitizedWorkerConfig,
    pub scheduler: SchedulerConfig,
    pub channel: SanitizedChannelConfig,
    pub transfer: TransferConfig,
    pub disks: DiskConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedClusterConfig {
    pub address: String,
    pub port: u16,
    pub username: String,
    pub password_configured: bool,
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedWorkerConfig {
    pub username: String,
    pub password_configured: bool,
    pub addresses: Vec<String>,
    pub job_pattern: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedChannelConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password_configured: bool,
    pub large_buffer: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            conversion: config.conversion.clone(),
            cluster: SanitizedClusterConfig {
                address: config.cluster.address.clone(),
                port: config.cluster.port,
                username: config.cluster.username.clone(),
                password_configured: !config.cluster.password.is_empty(),
                accept_invalid_certs: config.cluster.accept_invalid_certs,
            },
            workers: SanitizedWorkerConfig {
                username: config.workers.username.clone(),
                password_configured: !config.workers.password.is_empty(),
                addresses: config.workers.addresses.clone(),
                job_pattern: config.workers.job_pattern.clone(),
            },
            scheduler: config.scheduler.clone(),
            channel: SanitizedChannelConfig {
                host: config.channel.host.clone(),
                port: config.channel.port,
                username: config.channel.username.clone(),
                password_configured: !config.channel.password.is_empty(),
                large_buffer: config.channel.large_buffer,
            },
            transfer: config.transfer.clone(),
            disks: config.disks.clone(),
            metrics: config.metrics.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ConversionMode;

    fn config_with_secrets() -> Config {
        let mut config = Config {
            conversion: ConversionConfig::new(ConversionMode::Export),
            cluster: ClusterConfig::default(),
            workers: WorkerConfig::default(),
            scheduler: SchedulerConfig::default(),
            channel: SftpConfig::default(),
            transfer: TransferConfig::default(),
            disks: DiskConfig::default(),
            metrics: MetricsConfig::default(),
        };
        config.cluster.password = Secret::new("rest-pw");
        config.workers.password = Secret::new("cvm-pw");
        config.channel.password = Secret::new("sftp-pw");
        config
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        assert_eq!(format!("{:?}", Secret::new("abc")), "Secret(***)");
        assert_eq!(format!("{:?}", Secret::default()), "Secret(<empty>)");
    }

    #[test]
    fn test_sanitized_config_hides_passwords() {
        let config = config_with_secrets();
        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();

        assert!(!json.contains("rest-pw"));
        assert!(!json.contains("cvm-pw"));
        assert!(!json.contains("sftp-pw"));
        assert!(sanitized.cluster.password_configured);
        assert!(sanitized.workers.password_configured);
        assert!(sanitized.channel.password_configured);
    }
}
