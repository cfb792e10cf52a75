//! Types reported by the cluster directory.

use serde::{Deserialize, Serialize};

/// One node as reported by the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeNode {
    pub address: String,
    /// Coordinator nodes have access to the storage and run conversions.
    pub is_coordinator: bool,
}

impl ComputeNode {
    pub fn new(address: impl Into<String>, is_coordinator: bool) -> Self {
        Self {
            address: address.into(),
            is_coordinator,
        }
    }
}
