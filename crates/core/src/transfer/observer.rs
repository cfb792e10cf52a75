//! Observers that report how much of a destination exists so far.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::channel::{ChannelError, TransferChannel};

/// Reports the current size of a transfer destination.
#[async_trait]
pub trait DestinationObserver: Send + Sync {
    /// `Ok(None)` while the destination does not exist yet.
    async fn observed_size(&self) -> Result<Option<u64>, ChannelError>;
}

/// Observes a file on the local filesystem.
pub struct LocalFileObserver {
    path: PathBuf,
}

impl LocalFileObserver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DestinationObserver for LocalFileObserver {
    async fn observed_size(&self) -> Result<Option<u64>, ChannelError> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ChannelError::Io(e)),
        }
    }
}

/// Observes a remote file through the channel's `stat`.
pub struct RemoteObserver {
    channel: Arc<dyn TransferChannel>,
    remote_path: String,
}

impl RemoteObserver {
    pub fn new(channel: Arc<dyn TransferChannel>, remote_path: impl Into<String>) -> Self {
        Self {
            channel,
            remote_path: remote_path.into(),
        }
    }
}

#[async_trait]
impl DestinationObserver for RemoteObserver {
    async fn observed_size(&self) -> Result<Option<u64>, ChannelError> {
        match self.channel.stat(&self.remote_path).await {
            Ok(size) => Ok(Some(size)),
            Err(ChannelError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
