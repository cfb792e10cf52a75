//! Error types for the scheduler.

use thiserror::Error;

use crate::pool::PoolError;

/// Fatal conditions that abort a conversion wave.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The pool has no nodes to place jobs on.
    #[error("No worker nodes available to place {jobs} jobs")]
    EmptyPool { jobs: usize },

    /// A node could not be queried.
    #[error(
        "Cannot {operation} on worker node {node}: {source}. \
         Check SSH reachability and the [workers] credentials"
    )]
    UnreachableNode {
        node: String,
        operation: &'static str,
        #[source]
        source: PoolError,
    },

    /// A node refused a job submission.
    #[error("Worker node {node} rejected job {job}: {source}")]
    SubmitFailed {
        job: String,
        node: String,
        #[source]
        source: PoolError,
    },

    /// No node had headroom for longer than the configured wait.
    #[error(
        "Job {job} could not be placed after {waited_secs}s: every worker node is at capacity. \
         Raise scheduler.max_jobs_per_node or max_placement_wait_secs"
    )]
    PlacementTimeout { job: String, waited_secs: u64 },
}

impl SchedulerError {
    pub(crate) fn unreachable(node: &str, operation: &'static str, source: PoolError) -> Self {
        Self::UnreachableNode {
            node: node.to_string(),
            operation,
            source,
        }
    }
}
