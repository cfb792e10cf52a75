//! Configuration for worker nodes and the conversion command.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::Credential;
use crate::config::Secret;

/// How to reach worker nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// SSH login user on the worker nodes.
    #[serde(default = "default_username")]
    pub username: String,

    /// SSH password, handed to sshpass through the environment.
    #[serde(default)]
    pub password: Secret,

    /// Path to the ssh client.
    #[serde(default = "default_ssh_path")]
    pub ssh_path: PathBuf,

    /// Path to sshpass.
    #[serde(default = "default_sshpass_path")]
    pub sshpass_path: PathBuf,

    /// SSH connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Upper bound for one remote command, in seconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// Static node list. When non-empty, cluster discovery is skipped.
    #[serde(default)]
    pub addresses: Vec<String>,

    /// Process-listing substring identifying a running conversion.
    #[serde(default = "default_job_pattern")]
    pub job_pattern: String,
}

fn default_username() -> String {
    "nutanix".to_string()
}

fn default_ssh_path() -> PathBuf {
    PathBuf::from("ssh")
}

fn default_sshpass_path() -> PathBuf {
    PathBuf::from("sshpass")
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_command_timeout() -> u64 {
    60
}

fn default_job_pattern() -> String {
    "qemu-img".to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: Secret::default(),
            ssh_path: default_ssh_path(),
            sshpass_path: default_sshpass_path(),
            connect_timeout_secs: default_connect_timeout(),
            command_timeout_secs: default_command_timeout(),
            addresses: Vec::new(),
            job_pattern: default_job_pattern(),
        }
    }
}

impl WorkerConfig {
    /// Credential shared by every node of the cluster.
    pub fn credential(&self) -> Credential {
        Credential::new(self.username.clone(), self.password.clone())
    }
}

/// Direction of the conversion wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionMode {
    /// Source cluster: raw vdisk → qcow2 in the export container.
    Export,
    /// Destination cluster: uploaded qcow2 → raw in the import container.
    Import,
}

impl ConversionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionMode::Export => "export",
            ConversionMode::Import => "import",
        }
    }
}

/// Configuration for the remote `qemu-img convert` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Which side of the migration this run converts for.
    pub mode: ConversionMode,

    /// Path to qemu-img on the worker nodes.
    #[serde(default = "default_qemu_img_path")]
    pub qemu_img_path: String,

    /// NFS host the worker reads and writes through.
    #[serde(default = "default_nfs_host")]
    pub nfs_host: String,

    /// Compress qcow2 output. Costs worker CPU, saves transfer bytes.
    #[serde(default)]
    pub compress: bool,

    /// Container receiving exported qcow2 files on the source cluster.
    #[serde(default = "default_export_container")]
    pub export_container: String,

    /// Container receiving uploaded images on the destination cluster.
    #[serde(default = "default_import_container")]
    pub import_container: String,
}

fn default_qemu_img_path() -> String {
    "/usr/local/nutanix/bin/qemu-img".to_string()
}

fn default_nfs_host() -> String {
    "127.0.0.1".to_string()
}

fn default_export_container() -> String {
    "exportcontainer".to_string()
}

fn default_import_container() -> String {
    "sftpcontainer".to_string()
}

impl ConversionConfig {
    /// Creates a config with defaults for the given mode.
    pub fn new(mode: ConversionMode) -> Self {
        Self {
            mode,
            qemu_img_path: default_qemu_img_path(),
            nfs_host: default_nfs_host(),
            compress: false,
            export_container: default_export_container(),
            import_container: default_import_container(),
        }
    }

    /// Enables qcow2 compression.
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    /// Remote container the transfer stage reads from or writes to.
    pub fn transfer_container(&self) -> &str {
        match self.mode {
            ConversionMode::Export => &self.export_container,
            ConversionMode::Import => &self.import_container,
        }
    }
}
