//! SSH-based remote executor.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::WorkerConfig;
use super::error::PoolError;
use super::traits::{CommandOutput, RemoteExec};
use super::types::WorkerNode;

/// Exit status ssh uses for its own failures (connection, auth).
const SSH_ERROR_STATUS: i32 = 255;

/// sshpass exit statuses that mean the login never happened.
const SSHPASS_LOGIN_FAILURES: [i32; 4] = [2, 3, 5, 6];

/// Runs commands on worker nodes through `sshpass` and `ssh`.
pub struct SshExec {
    config: WorkerConfig,
}

impl SshExec {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// Builds the sshpass argument vector. The password is not part of it.
    fn build_args(&self, node: &WorkerNode, command: &str) -> Vec<String> {
        vec![
            "-e".to_string(),
            self.config.ssh_path.to_string_lossy().to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.config.connect_timeout_secs),
            format!("{}@{}", node.credential.username, node.address),
            command.to_string(),
        ]
    }
}

#[async_trait]
impl RemoteExec for SshExec {
    fn name(&self) -> &str {
        "ssh"
    }

    async fn run(&self, node: &WorkerNode, command: &str) -> Result<CommandOutput, PoolError> {
        debug!(node = %node.address, command = %command, "Running remote command");

        let child = Command::new(&self.config.sshpass_path)
            .args(self.build_args(node, command))
            .env("SSHPASS", node.credential.password.expose())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PoolError::unreachable(
                    &node.address,
                    format!(
                        "failed to start {}: {}",
                        self.config.sshpass_path.display(),
                        e
                    ),
                )
            })?;

        let limit = Duration::from_secs(self.config.command_timeout_secs);
        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(PoolError::unreachable(&node.address, e.to_string())),
            Err(_) => {
                return Err(PoolError::unreachable(
                    &node.address,
                    format!("no answer within {} seconds", self.config.command_timeout_secs),
                ))
            }
        };

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        };

        match result.exit_code {
            Some(SSH_ERROR_STATUS) => Err(PoolError::unreachable(
                &node.address,
                first_line(&result.stderr, "ssh connection failed"),
            )),
            Some(code) if SSHPASS_LOGIN_FAILURES.contains(&code) => Err(PoolError::unreachable(
                &node.address,
                first_line(&result.stderr, "login rejected"),
            )),
            _ => Ok(result),
        }
    }
}

fn first_line(text: &str, fallback: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use crate::pool::types::Credential;
    use std::path::PathBuf;

    fn node() -> WorkerNode {
        WorkerNode::new(
            "10.0.0.2",
            Credential::new("nutanix", Secret::new("hunter2")),
        )
    }

    #[test]
    fn test_build_args() {
        let exec = SshExec::new(WorkerConfig::default());
        let args = exec.build_args(&node(), "ps -elf");
        assert_eq!(args[0], "-e");
        assert_eq!(args[1], "ssh");
        assert!(args.contains(&"ConnectTimeout=10".to_string()));
        assert_eq!(args[args.len() - 2], "nutanix@10.0.0.2");
        assert_eq!(args[args.len() - 1], "ps -elf");
    }

    #[test]
    fn test_password_not_in_args() {
        let exec = SshExec::new(WorkerConfig::default());
        let args = exec.build_args(&node(), "ps -elf");
        assert!(args.iter().all(|a| !a.contains("hunter2")));
    }

    #[tokio::test]
    async fn test_missing_sshpass_is_unreachable() {
        let config = WorkerConfig {
            sshpass_path: PathBuf::from("/nonexistent/sshpass"),
            ..Default::default()
        };
        let exec = SshExec::new(config);
        let err = exec.run(&node(), "true").await.unwrap_err();
        assert!(matches!(err, PoolError::Unreachable { .. }));
        assert_eq!(err.node(), "10.0.0.2");
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("\n  Permission denied\nmore", "x"), "Permission denied");
        assert_eq!(first_line("", "fallback"), "fallback");
    }
}
