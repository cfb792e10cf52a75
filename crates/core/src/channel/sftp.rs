//! SFTP-based transfer channel.
//!
//! Drives the OpenSSH `sftp` client through `sshpass`, feeding batch
//! commands on stdin. A fresh session is opened per operation so a
//! wedged server connection never outlives one attempt.

use async_trait::async_trait;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::config::{SftpConfig, LARGE_BUFFER_BYTES};
use super::error::ChannelError;
use super::parse::{classify_copy_output, parse_ls_output};
use super::traits::TransferChannel;

/// SFTP transfer channel implementation.
pub struct SftpChannel {
    config: SftpConfig,
}

impl SftpChannel {
    /// Creates a new SFTP channel with the given configuration.
    pub fn new(config: SftpConfig) -> Self {
        Self { config }
    }

    /// Builds the sshpass/sftp argument list, excluding the batch input.
    fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-e".to_string(),
            self.config.sftp_path.to_string_lossy().to_string(),
        ];

        if self.config.large_buffer {
            args.extend(["-B".to_string(), LARGE_BUFFER_BYTES.to_string()]);
        }

        args.extend([
            "-P".to_string(),
            self.config.port.to_string(),
            // Cluster VIPs move between nodes; host keys change with them.
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            self.config.destination(),
        ]);

        args
    }

    /// Runs one sftp session with the given batch commands on stdin.
    async fn run_batch(&self, batch: String) -> Result<Output, ChannelError> {
        debug!(host = %self.config.host, batch = %batch.trim_end(), "Running sftp batch");

        let mut child = Command::new(&self.config.sshpass_path)
            .args(self.build_args())
            .env("SSHPASS", self.config.password.expose())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ChannelError::Spawn {
                program: self.config.sshpass_path.clone(),
                source: e,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(batch.as_bytes()).await?;
            // Dropping stdin ends the batch; sftp exits after the last command.
        }

        let output = child.wait_with_output().await?;
        debug!(
            status = ?output.status.code(),
            stderr = %String::from_utf8_lossy(&output.stderr).trim_end(),
            "sftp batch finished"
        );
        Ok(output)
    }
}

/// Quotes a path for the sftp batch grammar.
fn quote(path: &str) -> String {
    format!("\"{}\"", path.replace('\\', "\\\\").replace('"', "\\\""))
}

#[async_trait]
impl TransferChannel for SftpChannel {
    fn name(&self) -> &str {
        "sftp"
    }

    async fn stat(&self, remote_path: &str) -> Result<u64, ChannelError> {
        let output = self
            .run_batch(format!("ls -l {}\n", quote(remote_path)))
            .await?;
        parse_ls_output(
            remote_path,
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        )
    }

    async fn push(&self, local_path: &Path, remote_path: &str) -> Result<(), ChannelError> {
        let local = local_path.to_string_lossy();
        let batch = format!(
            "put {} {}\nchmod 644 {}\n",
            quote(&local),
            quote(remote_path),
            quote(remote_path)
        );
        let output = self.run_batch(batch).await?;
        classify_copy_output(
            remote_path,
            output.status.success(),
            &String::from_utf8_lossy(&output.stderr),
        )
    }

    async fn pull(&self, remote_path: &str, local_path: &Path) -> Result<(), ChannelError> {
        let local = local_path.to_string_lossy();
        let batch = format!("get {} {}\n", quote(remote_path), quote(&local));
        let output = self.run_batch(batch).await?;
        classify_copy_output(
            remote_path,
            output.status.success(),
            &String::from_utf8_lossy(&output.stderr),
        )
    }
}
