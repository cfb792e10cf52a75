//! A full conversion wave: place everything, then wait for drain.

use chrono::Utc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::barrier::CompletionBarrier;
use super::config::SchedulerConfig;
use super::error::SchedulerError;
use super::placement::JobScheduler;
use super::types::WaveReport;
use crate::pool::{Job, WorkerPool};

/// Runs one wave over `pool`.
pub async fn run_wave(
    pool: &dyn WorkerPool,
    jobs: &[Job],
    config: &SchedulerConfig,
) -> Result<WaveReport, SchedulerError> {
    let wave_id = Uuid::new_v4();
    let span = info_span!("wave", wave_id = %wave_id);

    async move {
        let started_at = Utc::now();
        info!(
            jobs = jobs.len(),
            nodes = pool.nodes().len(),
            cap = config.max_jobs_per_node,
            "Starting conversion wave"
        );

        let placements = JobScheduler::new(config.clone())
            .place_all(pool, jobs)
            .await?;
        let drain = CompletionBarrier::new(config.drain_interval())
            .wait_for_drain(pool)
            .await?;

        let finished_at = Utc::now();
        info!(
            placed = placements.len(),
            elapsed_secs = (finished_at - started_at).num_seconds(),
            "Conversion wave complete"
        );

        Ok(WaveReport {
            wave_id,
            placements,
            drain,
            started_at,
            finished_at,
        })
    }
    .instrument(span)
    .await
}
