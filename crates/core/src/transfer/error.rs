//! Error types for transfers.

use thiserror::Error;

use crate::channel::ChannelError;

/// Fatal transfer outcomes. Transient channel failures never surface
/// here unless retries ran out.
#[derive(Debug, Error)]
pub enum TransferError {
    /// A file the transfer depends on does not exist.
    #[error("{path} does not exist: {hint}")]
    PreconditionMissing { path: String, hint: String },

    /// A transient channel failure persisted past the retry cap.
    #[error("Giving up on {operation} of {target} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: &'static str,
        target: String,
        attempts: u32,
        #[source]
        last_error: ChannelError,
    },

    /// A non-retryable channel failure.
    #[error("{operation} of {target} failed: {source}")]
    ChannelFailure {
        operation: &'static str,
        target: String,
        #[source]
        source: ChannelError,
    },

    /// The transfer ended before its destination was ever observed.
    #[error("Transfer of {target} never started: {reason}")]
    TransferNeverStarted { target: String, reason: String },

    /// The transfer task died after making progress.
    #[error("Transfer of {target} aborted: {reason}")]
    TransferAborted { target: String, reason: String },

    /// The destination size differs from the source after completion.
    #[error(
        "Transfer of {path} incomplete: expected {expected} bytes, found {observed}. \
         Re-run the transfer"
    )]
    TransferIncomplete {
        path: String,
        expected: u64,
        observed: u64,
    },

    /// Local filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    pub fn precondition_missing(path: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::PreconditionMissing {
            path: path.into(),
            hint: hint.into(),
        }
    }
}
