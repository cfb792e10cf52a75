//! Mock worker pool for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::fixtures;
use crate::pool::{Job, PoolError, WorkerNode, WorkerPool};

/// A recorded submission for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSubmission {
    /// Address of the node that received the job.
    pub node: String,
    /// The submitted job.
    pub job: Job,
    /// Count the node reported at its most recent query.
    pub last_observed_count: Option<usize>,
}

#[derive(Debug, Default)]
struct NodeScript {
    counts: VecDeque<usize>,
    queries: usize,
    last_observed: Option<usize>,
    unreachable: bool,
}

/// Mock implementation of the WorkerPool trait.
///
/// Provides controllable behavior for testing:
/// - Script the running-job counts each node reports, in order
/// - Mark nodes unreachable
/// - Record submissions with the count seen right before them
///
/// The last scripted count repeats once the script runs out; a node
/// with no script reports 0.
///
/// # Example
///
/// ```rust,ignore
/// use shuttle_core::testing::MockWorkerPool;
///
/// let pool = MockWorkerPool::with_nodes(2);
/// pool.script_counts(0, vec![0, 2, 0]).await;
///
/// scheduler.place_all(&pool, &jobs).await?;
///
/// let submissions = pool.recorded_submissions().await;
/// assert_eq!(submissions[0].node, "10.0.0.1");
/// ```
#[derive(Debug)]
pub struct MockWorkerPool {
    nodes: Vec<WorkerNode>,
    /// Per-node scripted state, indexed like `nodes`.
    scripts: Arc<RwLock<Vec<NodeScript>>>,
    /// Recorded submissions.
    submissions: Arc<RwLock<Vec<RecordedSubmission>>>,
    /// If set, the next submission will fail with this error.
    next_submit_error: Arc<RwLock<Option<PoolError>>>,
}

impl MockWorkerPool {
    /// Create a mock pool over the given nodes.
    pub fn new(nodes: Vec<WorkerNode>) -> Self {
        let scripts = nodes.iter().map(|_| NodeScript::default()).collect();
        Self {
            nodes,
            scripts: Arc::new(RwLock::new(scripts)),
            submissions: Arc::new(RwLock::new(Vec::new())),
            next_submit_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a mock pool of `n` idle nodes named 10.0.0.1, 10.0.0.2, ...
    pub fn with_nodes(n: usize) -> Self {
        Self::new(fixtures::worker_nodes(n))
    }

    /// Set the counts node `index` reports on successive queries.
    pub async fn script_counts(&self, index: usize, counts: Vec<usize>) {
        self.scripts.write().await[index].counts = counts.into();
    }

    /// Make every query against node `index` fail as unreachable.
    pub async fn set_unreachable(&self, index: usize) {
        self.scripts.write().await[index].unreachable = true;
    }

    /// Configure the next submission to fail with the given error.
    pub async fn set_next_submit_error(&self, error: PoolError) {
        *self.next_submit_error.write().await = Some(error);
    }

    /// Number of count queries node `index` has answered.
    pub async fn count_queries(&self, index: usize) -> usize {
        self.scripts.read().await[index].queries
    }

    /// Get all recorded submissions.
    pub async fn recorded_submissions(&self) -> Vec<RecordedSubmission> {
        self.submissions.read().await.clone()
    }

    /// Number of submissions each node received, indexed like the nodes.
    pub async fn submissions_per_node(&self) -> Vec<usize> {
        let submissions = self.submissions.read().await;
        self.nodes
            .iter()
            .map(|n| submissions.iter().filter(|s| s.node == n.address).count())
            .collect()
    }

    fn index_of(&self, node: &WorkerNode) -> Option<usize> {
        self.nodes.iter().position(|n| n.address == node.address)
    }
}

#[async_trait]
impl WorkerPool for MockWorkerPool {
    fn nodes(&self) -> &[WorkerNode] {
        &self.nodes
    }

    async fn running_job_count(&self, node: &WorkerNode) -> Result<usize, PoolError> {
        let index = self
            .index_of(node)
            .ok_or_else(|| PoolError::unreachable(&node.address, "not in mock pool"))?;
        let mut scripts = self.scripts.write().await;
        let script = &mut scripts[index];
        script.queries += 1;

        if script.unreachable {
            return Err(PoolError::unreachable(&node.address, "connection refused"));
        }

        let count = if script.counts.len() > 1 {
            script.counts.pop_front().unwrap_or_default()
        } else {
            script.counts.front().copied().unwrap_or_default()
        };
        script.last_observed = Some(count);
        Ok(count)
    }

    async fn submit(&self, node: &WorkerNode, job: &Job) -> Result<(), PoolError> {
        if let Some(err) = self.next_submit_error.write().await.take() {
            return Err(err);
        }

        let last_observed_count = match self.index_of(node) {
            Some(index) => self.scripts.read().await[index].last_observed,
            None => None,
        };
        self.submissions.write().await.push(RecordedSubmission {
            node: node.address.clone(),
            job: job.clone(),
            last_observed_count,
        });
        Ok(())
    }
}
