//! Mock remote executor for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::pool::{CommandOutput, PoolError, RemoteExec, WorkerNode};

/// Mock implementation of the RemoteExec trait.
///
/// Every command returns the configured output. Clones share state, so
/// a test can keep one handle while the pool owns another.
#[derive(Debug, Clone)]
pub struct MockExec {
    /// Recorded (node address, command) pairs.
    commands: Arc<RwLock<Vec<(String, String)>>>,
    /// Output returned for every command.
    output: Arc<RwLock<CommandOutput>>,
    /// If set, the next command will fail with this error.
    next_error: Arc<RwLock<Option<PoolError>>>,
}

impl Default for MockExec {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExec {
    /// Create a mock executor whose commands succeed with empty output.
    pub fn new() -> Self {
        Self {
            commands: Arc::new(RwLock::new(Vec::new())),
            output: Arc::new(RwLock::new(CommandOutput {
                exit_code: Some(0),
                ..Default::default()
            })),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the stdout returned for every command.
    pub async fn set_stdout(&self, stdout: &str) {
        self.output.write().await.stdout = stdout.to_string();
    }

    /// Set the exit code returned for every command.
    pub async fn set_exit_code(&self, code: Option<i32>) {
        self.output.write().await.exit_code = code;
    }

    /// Configure the next command to fail with the given error.
    pub async fn set_next_error(&self, error: PoolError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded commands.
    pub async fn recorded_commands(&self) -> Vec<(String, String)> {
        self.commands.read().await.clone()
    }
}

#[async_trait]
impl RemoteExec for MockExec {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, node: &WorkerNode, command: &str) -> Result<CommandOutput, PoolError> {
        self.commands
            .write()
            .await
            .push((node.address.clone(), command.to_string()));
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        Ok(self.output.read().await.clone())
    }
}
