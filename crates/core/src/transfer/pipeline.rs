//! Sequential download and upload of disk images.

use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, info_span, Instrument};

use super::config::TransferConfig;
use super::error::TransferError;
use super::monitor::ProgressMonitor;
use super::observer::{LocalFileObserver, RemoteObserver};
use super::retry::{ChannelOp, RetryPolicy};
use super::types::{TransferDirection, TransferProgress, TransferResult, TransferTask};
use crate::channel::TransferChannel;
use crate::metrics;
use crate::pool::Job;

/// Moves images between the local staging directory and one remote
/// container, one file at a time.
pub struct TransferPipeline {
    channel: Arc<dyn TransferChannel>,
    retry: RetryPolicy,
    monitor: ProgressMonitor,
    config: TransferConfig,
    remote_dir: String,
}

impl TransferPipeline {
    pub fn new(
        channel: Arc<dyn TransferChannel>,
        config: TransferConfig,
        remote_dir: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            retry: RetryPolicy::from_config(&config.retry),
            monitor: ProgressMonitor::new(config.progress_interval()),
            config,
            remote_dir: remote_dir.into(),
        }
    }

    /// Forwards every progress sample to `tx`.
    pub fn with_progress_channel(mut self, tx: mpsc::Sender<TransferProgress>) -> Self {
        self.monitor = self.monitor.with_progress_channel(tx);
        self
    }

    /// Remote path of `name` inside the configured container.
    pub fn remote_path(&self, name: &str) -> String {
        format!("/{}/{}", self.remote_dir.trim_matches('/'), name)
    }

    /// Local staging path of `name`.
    pub fn local_path(&self, name: &str) -> PathBuf {
        self.config.local_dir.join(name)
    }

    /// Pulls the remote image `name` into the staging directory.
    pub async fn download(&self, name: &str, owner: &str) -> Result<TransferResult, TransferError> {
        let span = info_span!("transfer", direction = "download", owner = %owner, file = %name);
        async {
            tokio::fs::create_dir_all(&self.config.local_dir).await?;
            let remote = self.remote_path(name);
            let local = self.local_path(name);

            let channel = &self.channel;
            let expected = self
                .retry
                .run(ChannelOp::Stat, &remote, || channel.stat(&remote))
                .await?;
            info!(remote = %remote, bytes = expected, "Starting download");

            let task = TransferTask {
                source_path: remote.clone(),
                destination_path: local.display().to_string(),
                expected_size_bytes: expected,
                owner_label: owner.to_string(),
                direction: TransferDirection::Download,
            };

            let channel = Arc::clone(&self.channel);
            let retry = self.retry.clone();
            let target = local.clone();
            let transfer = async move {
                retry
                    .run(ChannelOp::Pull, &remote, || channel.pull(&remote, &target))
                    .await
            }
            .boxed();

            let observer = LocalFileObserver::new(&local);
            self.finish(&task, self.monitor.run(&task, transfer, &observer).await)
        }
        .instrument(span)
        .await
    }

    /// Pushes the local image at `local` into the remote container.
    pub async fn upload(&self, local: &Path, owner: &str) -> Result<TransferResult, TransferError> {
        let name = local
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let span = info_span!("transfer", direction = "upload", owner = %owner, file = %name);
        async {
            let expected = match tokio::fs::metadata(local).await {
                Ok(meta) => meta.len(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(TransferError::precondition_missing(
                        local.display().to_string(),
                        "nothing to upload; download the image from the source cluster first",
                    ))
                }
                Err(e) => return Err(TransferError::Io(e)),
            };

            let remote = self.remote_path(&name);
            info!(remote = %remote, bytes = expected, "Starting upload");

            let task = TransferTask {
                source_path: local.display().to_string(),
                destination_path: remote.clone(),
                expected_size_bytes: expected,
                owner_label: owner.to_string(),
                direction: TransferDirection::Upload,
            };

            let channel = Arc::clone(&self.channel);
            let retry = self.retry.clone();
            let source = local.to_path_buf();
            let target = remote.clone();
            let transfer = async move {
                retry
                    .run(ChannelOp::Push, &target, || channel.push(&source, &target))
                    .await
            }
            .boxed();

            let observer = RemoteObserver::new(Arc::clone(&self.channel), remote);
            self.finish(&task, self.monitor.run(&task, transfer, &observer).await)
        }
        .instrument(span)
        .await
    }

    /// Downloads every job's artifact in order. The first failure aborts.
    pub async fn download_all(&self, jobs: &[Job]) -> Result<Vec<TransferResult>, TransferError> {
        let mut results = Vec::with_capacity(jobs.len());
        for job in jobs {
            results.push(self.download(&job.destination_name, &job.owner_label).await?);
        }
        Ok(results)
    }

    /// Uploads every file in order. The first failure aborts.
    pub async fn upload_all(
        &self,
        files: &[(PathBuf, String)],
    ) -> Result<Vec<TransferResult>, TransferError> {
        let mut results = Vec::with_capacity(files.len());
        for (path, owner) in files {
            results.push(self.upload(path, owner).await?);
        }
        Ok(results)
    }

    /// Checks the final size and records metrics.
    fn finish(
        &self,
        task: &TransferTask,
        outcome: Result<TransferResult, TransferError>,
    ) -> Result<TransferResult, TransferError> {
        let direction = task.direction.as_str();
        let outcome = outcome.and_then(|result| {
            if self.config.verify_size && result.observed_bytes != task.expected_size_bytes {
                return Err(TransferError::TransferIncomplete {
                    path: task.destination_path.clone(),
                    expected: task.expected_size_bytes,
                    observed: result.observed_bytes,
                });
            }
            Ok(result)
        });

        match &outcome {
            Ok(result) => {
                metrics::TRANSFERS_TOTAL
                    .with_label_values(&[direction, "success"])
                    .inc();
                metrics::TRANSFER_BYTES
                    .with_label_values(&[direction])
                    .inc_by(result.observed_bytes);
                metrics::TRANSFER_DURATION
                    .with_label_values(&[direction])
                    .observe(result.elapsed.as_secs_f64());
                info!(
                    destination = %task.destination_path,
                    bytes = result.observed_bytes,
                    elapsed_secs = result.elapsed.as_secs(),
                    "Transfer complete"
                );
            }
            Err(_) => {
                metrics::TRANSFERS_TOTAL
                    .with_label_values(&[direction, "failure"])
                    .inc();
            }
        }
        outcome
    }
}
