//! Management API connection settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Secret;

/// How to reach the cluster management REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Cluster virtual IP or hostname.
    #[serde(default)]
    pub address: String,

    /// HTTPS port of the management gateway.
    #[serde(default = "default_port")]
    pub port: u16,

    /// API user.
    #[serde(default = "default_username")]
    pub username: String,

    /// API password.
    #[serde(default)]
    pub password: Secret,

    /// Clusters ship with self-signed certificates.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    9440
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_accept_invalid_certs() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: default_port(),
            username: default_username(),
            password: Secret::default(),
            accept_invalid_certs: default_accept_invalid_certs(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ClusterConfig {
    /// Base URL of the v1 REST services.
    pub fn base_url(&self) -> String {
        format!(
            "https://{}:{}/PrismGateway/services/rest/v1",
            self.address, self.port
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
