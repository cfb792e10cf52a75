//! Drain detection after a placement wave.

use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::info;

use super::error::SchedulerError;
use super::types::DrainReport;
use crate::metrics;
use crate::pool::WorkerPool;

/// Blocks until no conversion is observed running on any node.
///
/// Completion is inferred from process counts alone, so a job that
/// crashed on start looks the same as one that finished. Callers check
/// the produced artifacts afterwards.
pub struct CompletionBarrier {
    interval: Duration,
}

impl CompletionBarrier {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Polls every node until the summed running count is exactly zero.
    ///
    /// Waits without bound; an unreachable node aborts the wait.
    pub async fn wait_for_drain(
        &self,
        pool: &dyn WorkerPool,
    ) -> Result<DrainReport, SchedulerError> {
        let started = Instant::now();
        let mut polls = 0u32;

        loop {
            polls += 1;
            metrics::DRAIN_POLLS.inc();

            let mut running = 0usize;
            for node in pool.nodes() {
                running += pool.running_job_count(node).await.map_err(|e| {
                    SchedulerError::unreachable(&node.address, "count running jobs", e)
                })?;
            }

            if running == 0 {
                info!(polls, waited_secs = started.elapsed().as_secs(), "Pool drained");
                return Ok(DrainReport {
                    polls,
                    waited: started.elapsed(),
                });
            }

            info!(running, polls, "Waiting for conversions to finish");
            sleep(self.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWorkerPool;

    #[tokio::test(start_paused = true)]
    async fn test_drains_only_at_zero() {
        let pool = MockWorkerPool::with_nodes(2);
        pool.script_counts(0, vec![2, 1, 0, 0]).await;
        pool.script_counts(1, vec![1, 1, 1, 0]).await;

        let report = CompletionBarrier::new(Duration::from_secs(5))
            .wait_for_drain(&pool)
            .await
            .unwrap();

        assert_eq!(report.polls, 4);
        assert_eq!(report.waited, Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_pool_returns_immediately() {
        let pool = MockWorkerPool::with_nodes(3);
        let report = CompletionBarrier::new(Duration::from_secs(5))
            .wait_for_drain(&pool)
            .await
            .unwrap();
        assert_eq!(report.polls, 1);
        assert_eq!(report.waited, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_node_aborts_wait() {
        let pool = MockWorkerPool::with_nodes(2);
        pool.script_counts(0, vec![1]).await;
        pool.set_unreachable(1).await;

        let result = CompletionBarrier::new(Duration::from_secs(5))
            .wait_for_drain(&pool)
            .await;
        assert!(matches!(result, Err(SchedulerError::UnreachableNode { .. })));
    }
}
