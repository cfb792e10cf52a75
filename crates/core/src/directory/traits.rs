//! Trait definitions for cluster discovery.

use async_trait::async_trait;

use super::error::DirectoryError;
use super::types::ComputeNode;

/// Source of the cluster's node list.
#[async_trait]
pub trait ClusterDirectory: Send + Sync {
    /// Returns the name of this directory implementation.
    fn name(&self) -> &str;

    /// Lists every node the cluster knows about.
    async fn list_compute_nodes(&self) -> Result<Vec<ComputeNode>, DirectoryError>;
}
