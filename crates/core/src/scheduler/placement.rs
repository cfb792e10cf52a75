//! Round-robin placement with live admission control.

use chrono::Utc;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use super::config::SchedulerConfig;
use super::error::SchedulerError;
use super::types::PlacementRecord;
use crate::metrics;
use crate::pool::{Job, WorkerPool};

/// Places every pending job on a node with headroom.
///
/// One cursor walks the pool round-robin. At each step the node under
/// the cursor is queried; if its running count is at most the cap, the
/// next pending job goes there. The cursor advances after every check,
/// placed or not, so load spreads evenly across idle nodes.
///
/// There is no give-up state unless `max_placement_wait_secs` is set:
/// with every node saturated the scheduler keeps cycling, pausing one
/// admission delay per fruitless pass over the pool.
pub struct JobScheduler {
    config: SchedulerConfig,
}

impl JobScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Places `jobs` in queue order and returns one record per job.
    ///
    /// Any query or submission failure aborts the wave; jobs already
    /// placed keep running on their nodes.
    pub async fn place_all(
        &self,
        pool: &dyn WorkerPool,
        jobs: &[Job],
    ) -> Result<Vec<PlacementRecord>, SchedulerError> {
        let nodes = pool.nodes();
        if jobs.is_empty() {
            return Ok(Vec::new());
        }
        if nodes.is_empty() {
            return Err(SchedulerError::EmptyPool { jobs: jobs.len() });
        }

        let cap = self.config.max_jobs_per_node;
        let delay = self.config.admission_delay();
        let max_wait = self.config.max_placement_wait();

        let mut placements = Vec::with_capacity(jobs.len());
        let mut cursor = 0usize;
        let mut next = 0usize;
        let mut busy_streak = 0usize;
        let mut waiting_since = Instant::now();

        while next < jobs.len() {
            let node = &nodes[cursor];
            let job = &jobs[next];

            let count = pool
                .running_job_count(node)
                .await
                .map_err(|e| SchedulerError::unreachable(&node.address, "count running jobs", e))?;

            if count <= cap {
                metrics::ADMISSION_CHECKS.with_label_values(&["admitted"]).inc();

                pool.submit(node, job)
                    .await
                    .map_err(|e| SchedulerError::SubmitFailed {
                        job: job.destination_name.clone(),
                        node: node.address.clone(),
                        source: e,
                    })?;

                metrics::JOBS_SUBMITTED
                    .with_label_values(&[node.address.as_str()])
                    .inc();
                info!(
                    job = %job.destination_name,
                    owner = %job.owner_label,
                    node = %node.address,
                    running = count,
                    queued = jobs.len() - next - 1,
                    "Job placed"
                );

                placements.push(PlacementRecord {
                    job: job.clone(),
                    node: node.address.clone(),
                    observed_count: count,
                    placed_at: Utc::now(),
                });
                next += 1;
                busy_streak = 0;
                waiting_since = Instant::now();

                // Lets the job appear in the node's process table before
                // the next count, including the barrier's first poll.
                sleep(delay).await;
            } else {
                metrics::ADMISSION_CHECKS.with_label_values(&["busy"]).inc();
                debug!(node = %node.address, running = count, cap, "Node at capacity");

                busy_streak += 1;
                if busy_streak == nodes.len() {
                    let waited = waiting_since.elapsed();
                    if let Some(limit) = max_wait {
                        if waited >= limit {
                            return Err(SchedulerError::PlacementTimeout {
                                job: job.destination_name.clone(),
                                waited_secs: waited.as_secs(),
                            });
                        }
                    }
                    warn!(
                        job = %job.destination_name,
                        nodes = nodes.len(),
                        waited_secs = waited.as_secs(),
                        "Every worker node is at capacity, waiting"
                    );
                    busy_streak = 0;
                    sleep(delay).await;
                }
            }

            cursor = (cursor + 1) % nodes.len();
        }

        Ok(placements)
    }
}
