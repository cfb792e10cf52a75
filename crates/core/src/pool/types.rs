//! Types for worker nodes and conversion jobs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::Secret;

/// Login material for a worker node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: Secret,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: Secret) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

/// One compute node capable of running conversion jobs.
///
/// Holds no job state: the running-job count is queried from the node
/// every time it is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerNode {
    /// Network endpoint (IP address or hostname).
    pub address: String,
    /// Credential used to reach the node.
    pub credential: Credential,
}

impl WorkerNode {
    pub fn new(address: impl Into<String>, credential: Credential) -> Self {
        Self {
            address: address.into(),
            credential,
        }
    }
}

impl fmt::Display for WorkerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// One disk conversion task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Path or URI of the input disk on a worker-accessible volume.
    #[serde(rename = "source")]
    pub source_locator: String,
    /// Name of the artifact the conversion produces.
    #[serde(rename = "destination")]
    pub destination_name: String,
    /// VM the disk belongs to, for logs and attribution.
    #[serde(rename = "owner")]
    pub owner_label: String,
}

impl Job {
    pub fn new(
        source_locator: impl Into<String>,
        destination_name: impl Into<String>,
        owner_label: impl Into<String>,
    ) -> Self {
        Self {
            source_locator: source_locator.into(),
            destination_name: destination_name.into(),
            owner_label: owner_label.into(),
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.destination_name, self.owner_label)
    }
}
