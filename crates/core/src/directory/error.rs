//! Error types for cluster discovery.

use thiserror::Error;

/// Errors that can occur while listing cluster nodes.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// No cluster address configured and no static worker list either.
    #[error("No cluster address configured: set [cluster].address or [workers].addresses")]
    NotConfigured,

    /// HTTP transport failure.
    #[error("Cluster API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the API.
    #[error("Cluster API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The API rejected the credentials.
    #[error("Cluster API rejected the credentials for user {username}")]
    Unauthorized { username: String },

    /// The listing contained no usable worker node.
    #[error("Cluster reported no coordinator nodes to run conversions on")]
    NoComputeNodes,
}
