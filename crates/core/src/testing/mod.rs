//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of every collaborator
//! trait, so waves and transfers can be exercised without a cluster.
//!
//! # Example
//!
//! ```rust,ignore
//! use shuttle_core::testing::{fixtures, MockWorkerPool};
//! use shuttle_core::scheduler::{run_wave, SchedulerConfig};
//!
//! let pool = MockWorkerPool::with_nodes(2);
//! pool.script_counts(0, vec![0, 2, 0]).await;
//!
//! let report = run_wave(&pool, &fixtures::jobs(3), &SchedulerConfig::default()).await?;
//! ```

mod mock_channel;
mod mock_directory;
mod mock_exec;
mod mock_observer;
mod mock_pool;

pub use mock_channel::MockChannel;
pub use mock_directory::MockDirectory;
pub use mock_exec::MockExec;
pub use mock_observer::MockObserver;
pub use mock_pool::{MockWorkerPool, RecordedSubmission};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::Secret;
    use crate::pool::{Credential, Job, WorkerNode};
    use crate::transfer::{TransferDirection, TransferTask};

    /// Create a worker node with test credentials.
    pub fn worker_node(address: &str) -> WorkerNode {
        WorkerNode::new(address, Credential::new("nutanix", Secret::new("test-password")))
    }

    /// Create `n` worker nodes addressed 10.0.0.1, 10.0.0.2, ...
    pub fn worker_nodes(n: usize) -> Vec<WorkerNode> {
        (1..=n)
            .map(|i| worker_node(&format!("10.0.0.{}", i)))
            .collect()
    }

    /// Create `n` export jobs named job-1.qcow2, job-2.qcow2, ...
    pub fn jobs(n: usize) -> Vec<Job> {
        (1..=n)
            .map(|i| {
                Job::new(
                    format!("/ctr1/.acropolis/vmdisk/disk-{}", i),
                    format!("job-{}.qcow2", i),
                    format!("vm-{}", i),
                )
            })
            .collect()
    }

    /// Create a download task expecting `expected` bytes.
    pub fn download_task(expected: u64) -> TransferTask {
        TransferTask {
            source_path: "/exportcontainer/disk.qcow2".to_string(),
            destination_path: "/tmp/disk.qcow2".to_string(),
            expected_size_bytes: expected,
            owner_label: "web01".to_string(),
            direction: TransferDirection::Download,
        }
    }

    /// Minimal export-mode configuration.
    pub const EXPORT_CONFIG: &str = r#"
[conversion]
mode = "export"

[workers]
addresses = ["10.0.0.1", "10.0.0.2"]
"#;
}
