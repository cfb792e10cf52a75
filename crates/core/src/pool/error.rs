//! Error types for the worker pool.

use thiserror::Error;

/// Errors that can occur while talking to a worker node.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The node could not be reached or refused the login.
    #[error("Worker node {node} is unreachable: {reason}")]
    Unreachable { node: String, reason: String },

    /// The node ran the command but it failed.
    #[error("Command on {node} exited with {status:?}: {stderr}")]
    CommandFailed {
        node: String,
        status: Option<i32>,
        stderr: String,
    },
}

impl PoolError {
    /// Creates an unreachable error.
    pub fn unreachable(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unreachable {
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// Address of the node involved.
    pub fn node(&self) -> &str {
        match self {
            Self::Unreachable { node, .. } | Self::CommandFailed { node, .. } => node,
        }
    }
}
