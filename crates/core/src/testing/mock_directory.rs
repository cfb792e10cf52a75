//! Mock cluster directory for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::directory::{ClusterDirectory, ComputeNode, DirectoryError};

/// Mock implementation of the ClusterDirectory trait.
#[derive(Debug)]
pub struct MockDirectory {
    nodes: Arc<RwLock<Vec<ComputeNode>>>,
    list_calls: Arc<RwLock<usize>>,
    /// If set, the next listing will fail with this error.
    next_error: Arc<RwLock<Option<DirectoryError>>>,
}

impl MockDirectory {
    /// Create a mock directory reporting `nodes`.
    pub fn new(nodes: Vec<ComputeNode>) -> Self {
        Self {
            nodes: Arc::new(RwLock::new(nodes)),
            list_calls: Arc::new(RwLock::new(0)),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Configure the next listing to fail with the given error.
    pub async fn set_next_error(&self, error: DirectoryError) {
        *self.next_error.write().await = Some(error);
    }

    /// Number of listings performed.
    pub async fn list_calls(&self) -> usize {
        *self.list_calls.read().await
    }
}

#[async_trait]
impl ClusterDirectory for MockDirectory {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_compute_nodes(&self) -> Result<Vec<ComputeNode>, DirectoryError> {
        *self.list_calls.write().await += 1;
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        Ok(self.nodes.read().await.clone())
    }
}
