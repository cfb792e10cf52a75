//! Worker pool backed by a remote executor.

use async_trait::async_trait;
use tracing::{debug, info};

use super::command::ConversionCommand;
use super::config::{ConversionConfig, WorkerConfig};
use super::error::PoolError;
use super::parse::count_matching_processes;
use super::traits::{CommandOutput, RemoteExec, WorkerPool};
use super::types::{Job, WorkerNode};
use crate::directory::{ClusterDirectory, DirectoryError};

const PROCESS_LISTING: &str = "ps -elf";

/// Worker pool that counts and starts conversions through a [`RemoteExec`].
pub struct RemoteWorkerPool<E> {
    nodes: Vec<WorkerNode>,
    exec: E,
    command: ConversionCommand,
    job_pattern: String,
}

impl<E: RemoteExec> RemoteWorkerPool<E> {
    pub fn new(
        nodes: Vec<WorkerNode>,
        exec: E,
        conversion: ConversionConfig,
        job_pattern: impl Into<String>,
    ) -> Self {
        Self {
            nodes,
            exec,
            command: ConversionCommand::new(conversion),
            job_pattern: job_pattern.into(),
        }
    }

    /// Builds the pool from the static address list, or from the
    /// coordinator nodes the directory reports when the list is empty.
    ///
    /// The directory is only consulted, and only required, when no
    /// static addresses are configured.
    pub async fn from_directory(
        directory: Option<&dyn ClusterDirectory>,
        exec: E,
        workers: &WorkerConfig,
        conversion: ConversionConfig,
    ) -> Result<Self, DirectoryError> {
        let credential = workers.credential();

        let (addresses, source): (Vec<String>, &str) = if workers.addresses.is_empty() {
            let directory = directory.ok_or(DirectoryError::NotConfigured)?;
            let discovered = directory
                .list_compute_nodes()
                .await?
                .into_iter()
                .filter(|n| n.is_coordinator)
                .map(|n| n.address)
                .collect();
            (discovered, directory.name())
        } else {
            (workers.addresses.clone(), "static")
        };

        if addresses.is_empty() {
            return Err(DirectoryError::NoComputeNodes);
        }

        info!(count = addresses.len(), source, "Worker pool assembled");

        let nodes = addresses
            .into_iter()
            .map(|address| WorkerNode::new(address, credential.clone()))
            .collect();

        Ok(Self::new(nodes, exec, conversion, workers.job_pattern.clone()))
    }

    pub fn command(&self) -> &ConversionCommand {
        &self.command
    }

    fn check(node: &WorkerNode, output: CommandOutput) -> Result<CommandOutput, PoolError> {
        if output.success() {
            Ok(output)
        } else {
            Err(PoolError::CommandFailed {
                node: node.address.clone(),
                status: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}

#[async_trait]
impl<E: RemoteExec> WorkerPool for RemoteWorkerPool<E> {
    fn nodes(&self) -> &[WorkerNode] {
        &self.nodes
    }

    async fn running_job_count(&self, node: &WorkerNode) -> Result<usize, PoolError> {
        let output = Self::check(node, self.exec.run(node, PROCESS_LISTING).await?)?;
        let count = count_matching_processes(&output.stdout, &self.job_pattern);
        debug!(node = %node.address, count, "Running jobs counted");
        Ok(count)
    }

    async fn submit(&self, node: &WorkerNode, job: &Job) -> Result<(), PoolError> {
        let command = self.command.build(job);
        Self::check(node, self.exec.run_background(node, &command).await?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::ComputeNode;
    use crate::pool::ConversionMode;
    use crate::testing::{MockDirectory, MockExec};

    fn conversion() -> ConversionConfig {
        ConversionConfig::new(ConversionMode::Export)
    }

    #[tokio::test]
    async fn test_from_directory_keeps_coordinators() {
        let directory = MockDirectory::new(vec![
            ComputeNode::new("10.0.0.1", true),
            ComputeNode::new("10.0.0.50", false),
            ComputeNode::new("10.0.0.2", true),
        ]);
        let pool = RemoteWorkerPool::from_directory(
            Some(&directory),
            MockExec::new(),
            &WorkerConfig::default(),
            conversion(),
        )
        .await
        .unwrap();

        let addresses: Vec<_> = pool.nodes().iter().map(|n| n.address.as_str()).collect();
        assert_eq!(addresses, vec!["10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test]
    async fn test_static_addresses_skip_discovery() {
        let directory = MockDirectory::new(vec![]);
        let workers = WorkerConfig {
            addresses: vec!["192.168.1.10".to_string()],
            ..Default::default()
        };
        let pool = RemoteWorkerPool::from_directory(
            Some(&directory),
            MockExec::new(),
            &workers,
            conversion(),
        )
        .await
        .unwrap();

        assert_eq!(pool.nodes().len(), 1);
        assert_eq!(directory.list_calls().await, 0);
    }

    #[tokio::test]
    async fn test_static_addresses_need_no_directory() {
        let workers = WorkerConfig {
            addresses: vec!["192.168.1.10".to_string(), "192.168.1.11".to_string()],
            ..Default::default()
        };
        let pool = RemoteWorkerPool::from_directory(None, MockExec::new(), &workers, conversion())
            .await
            .unwrap();

        let addresses: Vec<_> = pool.nodes().iter().map(|n| n.address.as_str()).collect();
        assert_eq!(addresses, vec!["192.168.1.10", "192.168.1.11"]);
    }

    #[tokio::test]
    async fn test_discovery_without_directory_is_not_configured() {
        let result = RemoteWorkerPool::from_directory(
            None,
            MockExec::new(),
            &WorkerConfig::default(),
            conversion(),
        )
        .await;
        assert!(matches!(result, Err(DirectoryError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_no_coordinators_is_error() {
        let directory = MockDirectory::new(vec![ComputeNode::new("10.0.0.50", false)]);
        let result = RemoteWorkerPool::from_directory(
            Some(&directory),
            MockExec::new(),
            &WorkerConfig::default(),
            conversion(),
        )
        .await;
        assert!(matches!(result, Err(DirectoryError::NoComputeNodes)));
    }

    #[tokio::test]
    async fn test_running_job_count_parses_listing() {
        let exec = MockExec::new();
        exec.set_stdout(
            "0 S nutanix 1 1 0 80 0 - 1 - 10:00 ? 00:00:01 /usr/local/nutanix/bin/qemu-img convert a b\n\
             0 S nutanix 2 1 0 80 0 - 1 - 10:00 ? 00:00:00 grep qemu-img\n",
        )
        .await;
        let node = crate::testing::fixtures::worker_node("10.0.0.1");
        let pool =
            RemoteWorkerPool::new(vec![node.clone()], exec.clone(), conversion(), "qemu-img");

        assert_eq!(pool.running_job_count(&node).await.unwrap(), 1);
        assert_eq!(exec.recorded_commands().await[0].1, "ps -elf");
    }

    #[tokio::test]
    async fn test_submit_runs_detached_conversion() {
        let exec = MockExec::new();
        let node = crate::testing::fixtures::worker_node("10.0.0.1");
        let pool =
            RemoteWorkerPool::new(vec![node.clone()], exec.clone(), conversion(), "qemu-img");
        let job = Job::new("/ctr/.acropolis/vmdisk/abc", "vm_scsi.0.qcow2", "vm");

        pool.submit(&node, &job).await.unwrap();

        let commands = exec.recorded_commands().await;
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].0, "10.0.0.1");
        assert!(commands[0].1.starts_with("nohup /usr/local/nutanix/bin/qemu-img convert"));
        assert!(commands[0].1.ends_with(">/dev/null 2>&1 &"));
    }

    #[tokio::test]
    async fn test_failed_listing_is_command_failed() {
        let exec = MockExec::new();
        exec.set_exit_code(Some(1)).await;
        let node = crate::testing::fixtures::worker_node("10.0.0.1");
        let pool = RemoteWorkerPool::new(vec![node.clone()], exec, conversion(), "qemu-img");

        let err = pool.running_job_count(&node).await.unwrap_err();
        assert!(matches!(err, PoolError::CommandFailed { .. }));
    }
}
