//! Configuration for the SFTP transfer channel.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Secret;

/// Block size passed to `sftp -B` when large buffers are enabled.
pub const LARGE_BUFFER_BYTES: u32 = 131_072;

/// Configuration for the SFTP channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SftpConfig {
    /// SFTP endpoint host (the cluster virtual IP).
    #[serde(default)]
    pub host: String,

    /// SFTP port exposed by the cluster.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Login user for the SFTP endpoint.
    #[serde(default)]
    pub username: String,

    /// Login password, handed to sshpass through the environment.
    #[serde(default)]
    pub password: Secret,

    /// Path to the sftp client.
    #[serde(default = "default_sftp_path")]
    pub sftp_path: PathBuf,

    /// Path to sshpass.
    #[serde(default = "default_sshpass_path")]
    pub sshpass_path: PathBuf,

    /// Use a larger request buffer for faster transfers.
    /// Disable on busy networks where big packets cause retransmits.
    #[serde(default = "default_true")]
    pub large_buffer: bool,
}

fn default_port() -> u16 {
    2222
}

fn default_sftp_path() -> PathBuf {
    PathBuf::from("sftp")
}

fn default_sshpass_path() -> PathBuf {
    PathBuf::from("sshpass")
}

fn default_true() -> bool {
    true
}

impl Default for SftpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: String::new(),
            password: Secret::default(),
            sftp_path: default_sftp_path(),
            sshpass_path: default_sshpass_path(),
            large_buffer: true,
        }
    }
}

impl SftpConfig {
    /// `user@host` destination string.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}
