//! Trait definitions for the worker pool.

use async_trait::async_trait;

use super::error::PoolError;
use super::types::{Job, WorkerNode};

/// Captured result of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs shell commands on a worker node.
#[async_trait]
pub trait RemoteExec: Send + Sync {
    /// Returns the name of this executor implementation.
    fn name(&self) -> &str;

    /// Runs a command and waits for it to exit.
    async fn run(&self, node: &WorkerNode, command: &str) -> Result<CommandOutput, PoolError>;

    /// Starts a command that keeps running after the session closes.
    ///
    /// Returns once the node accepted the command; the command itself
    /// may not have started yet.
    async fn run_background(
        &self,
        node: &WorkerNode,
        command: &str,
    ) -> Result<CommandOutput, PoolError> {
        self.run(node, &detach(command)).await
    }
}

/// Wraps a command so it survives the end of the SSH session.
pub fn detach(command: &str) -> String {
    format!("nohup {} >/dev/null 2>&1 &", command)
}

/// A fixed set of nodes that accept conversion jobs.
///
/// The node list is stable for the lifetime of the pool. Job state is
/// never cached: every count is a fresh query against the node.
#[async_trait]
pub trait WorkerPool: Send + Sync {
    /// Nodes in a stable order.
    fn nodes(&self) -> &[WorkerNode];

    /// Number of conversion jobs currently running on `node`.
    async fn running_job_count(&self, node: &WorkerNode) -> Result<usize, PoolError>;

    /// Starts `job` on `node` without waiting for it to finish.
    async fn submit(&self, node: &WorkerNode, job: &Job) -> Result<(), PoolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detach() {
        assert_eq!(
            detach("qemu-img convert a b"),
            "nohup qemu-img convert a b >/dev/null 2>&1 &"
        );
    }

    #[test]
    fn test_command_output_success() {
        let ok = CommandOutput {
            exit_code: Some(0),
            ..Default::default()
        };
        assert!(ok.success());
        assert!(!CommandOutput::default().success());
    }
}
