//! Trait definitions for the transfer channel.

use async_trait::async_trait;
use std::path::Path;

use super::error::ChannelError;

/// One unreliable point-to-point file copy primitive.
///
/// Every operation may fail transiently; callers wrap them in a
/// [`RetryPolicy`](crate::transfer::RetryPolicy).
#[async_trait]
pub trait TransferChannel: Send + Sync {
    /// Returns the name of this channel implementation.
    fn name(&self) -> &str;

    /// Returns the size in bytes of a remote file.
    async fn stat(&self, remote_path: &str) -> Result<u64, ChannelError>;

    /// Copies a local file to the remote side.
    async fn push(&self, local_path: &Path, remote_path: &str) -> Result<(), ChannelError>;

    /// Copies a remote file to the local side.
    async fn pull(&self, remote_path: &str, local_path: &Path) -> Result<(), ChannelError>;
}
