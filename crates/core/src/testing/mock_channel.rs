//! Mock transfer channel for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::channel::{ChannelError, TransferChannel};

/// Call counters for each channel operation.
#[derive(Debug, Default, Clone, Copy)]
struct CallCounts {
    stat: usize,
    push: usize,
    pull: usize,
}

/// Mock implementation of the TransferChannel trait.
///
/// Behaves like a small in-memory remote store:
/// - `stat` reports sizes of known remote files, `NotFound` otherwise
/// - `pull` writes a local file of the remote file's size
/// - `push` records the local file's size under the remote path
///
/// Scripted outcomes are consumed before the store is consulted, so a
/// test can inject transient failures ahead of normal behavior.
///
/// # Example
///
/// ```rust,ignore
/// use shuttle_core::testing::MockChannel;
///
/// let channel = MockChannel::new();
/// channel.add_remote_file("/exportcontainer/d.qcow2", 5000).await;
/// channel.script_stat(vec![Err(ChannelError::permission_denied("busy"))]).await;
///
/// assert!(channel.stat("/exportcontainer/d.qcow2").await.is_err());
/// assert_eq!(channel.stat("/exportcontainer/d.qcow2").await?, 5000);
/// ```
#[derive(Debug)]
pub struct MockChannel {
    /// Remote path → size in bytes.
    files: Arc<RwLock<HashMap<String, u64>>>,
    stat_script: Arc<RwLock<VecDeque<Result<u64, ChannelError>>>>,
    push_script: Arc<RwLock<VecDeque<Result<(), ChannelError>>>>,
    pull_script: Arc<RwLock<VecDeque<Result<(), ChannelError>>>>,
    /// Simulated duration of a successful push or pull.
    transfer_delay: Arc<RwLock<Duration>>,
    /// If set, pulls write at most this many bytes.
    truncate_to: Arc<RwLock<Option<u64>>>,
    calls: Arc<RwLock<CallCounts>>,
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChannel {
    /// Create a mock channel with an empty remote store.
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(HashMap::new())),
            stat_script: Arc::new(RwLock::new(VecDeque::new())),
            push_script: Arc::new(RwLock::new(VecDeque::new())),
            pull_script: Arc::new(RwLock::new(VecDeque::new())),
            transfer_delay: Arc::new(RwLock::new(Duration::ZERO)),
            truncate_to: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(CallCounts::default())),
        }
    }

    /// Add a file to the remote store.
    pub async fn add_remote_file(&self, path: &str, size: u64) {
        self.files.write().await.insert(path.to_string(), size);
    }

    /// Size of a remote file, if present.
    pub async fn remote_size(&self, path: &str) -> Option<u64> {
        self.files.read().await.get(path).copied()
    }

    /// Queue outcomes for upcoming `stat` calls.
    pub async fn script_stat(&self, outcomes: Vec<Result<u64, ChannelError>>) {
        self.stat_script.write().await.extend(outcomes);
    }

    /// Queue outcomes for upcoming `push` calls.
    pub async fn script_push(&self, outcomes: Vec<Result<(), ChannelError>>) {
        self.push_script.write().await.extend(outcomes);
    }

    /// Queue outcomes for upcoming `pull` calls.
    pub async fn script_pull(&self, outcomes: Vec<Result<(), ChannelError>>) {
        self.pull_script.write().await.extend(outcomes);
    }

    /// Set the simulated duration of successful copies.
    pub async fn set_transfer_delay(&self, delay: Duration) {
        *self.transfer_delay.write().await = delay;
    }

    /// Make pulls stop short at `limit` bytes.
    pub async fn set_truncate_to(&self, limit: Option<u64>) {
        *self.truncate_to.write().await = limit;
    }

    /// Number of `stat` calls so far.
    pub async fn stat_calls(&self) -> usize {
        self.calls.read().await.stat
    }

    /// Number of `push` calls so far.
    pub async fn push_calls(&self) -> usize {
        self.calls.read().await.push
    }

    /// Number of `pull` calls so far.
    pub async fn pull_calls(&self) -> usize {
        self.calls.read().await.pull
    }

    async fn simulate_copy_time(&self) {
        let delay = *self.transfer_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl TransferChannel for MockChannel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn stat(&self, remote_path: &str) -> Result<u64, ChannelError> {
        self.calls.write().await.stat += 1;
        if let Some(outcome) = self.stat_script.write().await.pop_front() {
            return outcome;
        }
        self.remote_size(remote_path)
            .await
            .ok_or_else(|| ChannelError::not_found(remote_path))
    }

    async fn push(&self, local_path: &Path, remote_path: &str) -> Result<(), ChannelError> {
        self.calls.write().await.push += 1;
        if let Some(outcome) = self.push_script.write().await.pop_front() {
            outcome?;
        }
        let size = tokio::fs::metadata(local_path).await?.len();
        self.simulate_copy_time().await;
        self.add_remote_file(remote_path, size).await;
        Ok(())
    }

    async fn pull(&self, remote_path: &str, local_path: &Path) -> Result<(), ChannelError> {
        self.calls.write().await.pull += 1;
        if let Some(outcome) = self.pull_script.write().await.pop_front() {
            outcome?;
        }
        let size = self
            .remote_size(remote_path)
            .await
            .ok_or_else(|| ChannelError::not_found(remote_path))?;
        let size = match *self.truncate_to.read().await {
            Some(limit) => size.min(limit),
            None => size,
        };
        self.simulate_copy_time().await;
        tokio::fs::write(local_path, vec![0u8; size as usize]).await?;
        Ok(())
    }
}
