//! Error types for the transfer channel.

use std::path::PathBuf;
use thiserror::Error;

/// Classified outcome of a failed channel operation.
///
/// The SFTP server in front of the storage containers answers
/// "Permission denied" while it is busy or mid-operation, so that
/// variant is a transient condition, never an authorization verdict.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The remote object does not exist.
    #[error("Remote object not found: {path}")]
    NotFound { path: String },

    /// The server refused the request; usually overloaded.
    #[error("Permission denied by transfer server: {detail}")]
    PermissionDenied { detail: String },

    /// The client produced output we could not classify.
    #[error("Unrecognized transfer channel failure: {detail}")]
    Unknown { detail: String },

    /// The local side failed: the client tools or the local file.
    #[error(
        "Local side of the transfer failed: {detail}. \
         Check the staging directory and the sftp/sshpass install"
    )]
    Local { detail: String },

    /// The client program could not be started at all.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Local I/O failure around the transfer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChannelError {
    /// Creates a not found error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a permission denied error.
    pub fn permission_denied(detail: impl Into<String>) -> Self {
        Self::PermissionDenied {
            detail: detail.into(),
        }
    }

    /// Creates an unknown error.
    pub fn unknown(detail: impl Into<String>) -> Self {
        Self::Unknown {
            detail: detail.into(),
        }
    }

    /// Creates a local-side error.
    pub fn local(detail: impl Into<String>) -> Self {
        Self::Local {
            detail: detail.into(),
        }
    }

    /// Whether a retry after a short delay may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. } | Self::Unknown { .. })
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::Unknown { .. } => "unknown",
            Self::Local { .. } => "local",
            Self::Spawn { .. } => "spawn",
            Self::Io(_) => "io",
        }
    }
}
