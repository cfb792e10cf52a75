//! Progress sampling alongside a running transfer.

use chrono::Utc;
use futures::future::BoxFuture;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::error::TransferError;
use super::observer::DestinationObserver;
use super::types::{percent_of, TransferProgress, TransferResult, TransferTask};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Runs a transfer as its own task and samples the destination size
/// at a fixed interval until the task finishes.
///
/// The first sample is taken right after the task is spawned. One more
/// sample is always taken after the task is joined, so the reported
/// final percentage is the real terminal state.
///
/// A transfer that ends without its destination ever being observed is
/// reported as [`TransferError::TransferNeverStarted`], unless it already
/// failed with exhausted retries or a missing precondition.
pub struct ProgressMonitor {
    interval: Duration,
    progress_tx: Option<mpsc::Sender<TransferProgress>>,
}

impl ProgressMonitor {
    /// `interval` is raised to at least one millisecond.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            progress_tx: None,
        }
    }

    /// Also sends every sample to `tx`. Samples are dropped if the
    /// receiver lags.
    pub fn with_progress_channel(mut self, tx: mpsc::Sender<TransferProgress>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Drives `transfer` to completion while reporting progress for `task`.
    pub async fn run(
        &self,
        task: &TransferTask,
        transfer: BoxFuture<'static, Result<(), TransferError>>,
        observer: &dyn DestinationObserver,
    ) -> Result<TransferResult, TransferError> {
        let started = Instant::now();
        let mut handle = tokio::spawn(transfer);
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut sampler = Sampler {
            task,
            observer,
            started,
            last_observed: None,
            samples: Vec::new(),
            progress_tx: self.progress_tx.as_ref(),
        };

        let joined = loop {
            tokio::select! {
                biased;
                joined = &mut handle => break joined,
                _ = ticker.tick() => sampler.sample(false).await,
            }
        };

        sampler.sample(true).await;
        let ever_observed = sampler.last_observed.is_some();
        let target = task.destination_path.clone();

        match joined {
            Ok(Ok(())) if !ever_observed => {
                return Err(TransferError::TransferNeverStarted {
                    target,
                    reason: "transfer finished but the destination never appeared".to_string(),
                })
            }
            Ok(Ok(())) => {}
            Ok(Err(
                e @ (TransferError::RetriesExhausted { .. }
                | TransferError::PreconditionMissing { .. }),
            )) => return Err(e),
            Ok(Err(e)) if !ever_observed => {
                return Err(TransferError::TransferNeverStarted {
                    target,
                    reason: e.to_string(),
                })
            }
            Ok(Err(e)) => return Err(e),
            Err(join_error) if !ever_observed => {
                return Err(TransferError::TransferNeverStarted {
                    target,
                    reason: join_error.to_string(),
                })
            }
            Err(join_error) => {
                return Err(TransferError::TransferAborted {
                    target,
                    reason: join_error.to_string(),
                })
            }
        }

        let observed_bytes = sampler.last_observed.unwrap_or_default();
        let final_percent = sampler.samples.last().map(|s| s.percent).unwrap_or_default();
        Ok(TransferResult {
            task: task.clone(),
            observed_bytes,
            final_percent,
            elapsed: started.elapsed(),
            samples: sampler.samples,
        })
    }
}

struct Sampler<'a> {
    task: &'a TransferTask,
    observer: &'a dyn DestinationObserver,
    started: Instant,
    last_observed: Option<u64>,
    samples: Vec<TransferProgress>,
    progress_tx: Option<&'a mpsc::Sender<TransferProgress>>,
}

impl Sampler<'_> {
    /// Missing destinations read as 0 %; observer errors keep the last value.
    async fn sample(&mut self, is_final: bool) {
        match self.observer.observed_size().await {
            Ok(Some(size)) => self.last_observed = Some(size),
            Ok(None) => {}
            Err(e) => debug!(
                destination = %self.task.destination_path,
                error = %e,
                "Progress sample failed, keeping last value"
            ),
        }

        let observed_bytes = self.last_observed.unwrap_or_default();
        let percent = match self.task.expected_size_bytes {
            // An empty file has nothing to show until the copy has ended.
            0 if is_final => 100.0,
            expected => percent_of(observed_bytes, expected),
        };
        let elapsed = self.started.elapsed();

        info!(
            destination = %self.task.destination_path,
            percent = format!("{:.1}", percent),
            elapsed_secs = elapsed.as_secs(),
            "{} progress",
            self.task.direction
        );

        let progress = TransferProgress {
            destination_path: self.task.destination_path.clone(),
            observed_bytes,
            expected_bytes: self.task.expected_size_bytes,
            percent,
            elapsed,
            observed_at: Utc::now(),
            is_final,
        };
        if let Some(tx) = self.progress_tx {
            let _ = tx.try_send(progress.clone());
        }
        self.samples.push(progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelError;
    use crate::testing::{fixtures, MockObserver};
    use futures::FutureExt;
    use tokio::time::sleep;

    fn monitor() -> ProgressMonitor {
        ProgressMonitor::new(Duration::from_secs(5))
    }

    fn finishes_after(secs: u64) -> BoxFuture<'static, Result<(), TransferError>> {
        async move {
            sleep(Duration::from_secs(secs)).await;
            Ok(())
        }
        .boxed()
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_sampled_percentages() {
        let observer = MockObserver::new(vec![
            Ok(Some(0)),
            Ok(Some(250)),
            Ok(Some(750)),
            Ok(Some(1000)),
        ]);
        let task = fixtures::download_task(1000);

        let result = monitor()
            .run(&task, finishes_after(16), &observer)
            .await
            .unwrap();

        assert_eq!(result.intermediate_percents(), vec![0.0, 25.0, 75.0, 100.0]);
        assert_eq!(result.final_percent, 100.0);
        assert_eq!(result.observed_bytes, 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_sample_after_join() {
        let observer = MockObserver::new(vec![
            Ok(Some(0)),
            Ok(Some(250)),
            Ok(Some(750)),
            Ok(Some(1000)),
        ]);
        let task = fixtures::download_task(1000);

        let result = monitor()
            .run(&task, finishes_after(12), &observer)
            .await
            .unwrap();

        assert_eq!(result.intermediate_percents(), vec![0.0, 25.0, 75.0]);
        let last = result.samples.last().unwrap();
        assert!(last.is_final);
        assert_eq!(last.percent, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_destination_reads_as_zero() {
        let observer = MockObserver::new(vec![Ok(None), Ok(None), Ok(Some(500))]);
        let task = fixtures::download_task(500);

        let result = monitor()
            .run(&task, finishes_after(7), &observer)
            .await
            .unwrap();

        assert_eq!(result.intermediate_percents(), vec![0.0, 0.0]);
        assert_eq!(result.final_percent, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_errors_keep_last_value() {
        let observer = MockObserver::new(vec![
            Ok(Some(100)),
            Err(ChannelError::permission_denied("busy")),
            Ok(Some(400)),
        ]);
        let task = fixtures::download_task(400);

        let result = monitor()
            .run(&task, finishes_after(7), &observer)
            .await
            .unwrap();

        assert_eq!(result.intermediate_percents(), vec![25.0, 25.0]);
        assert_eq!(result.final_percent, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_spawn_is_never_started() {
        let observer = MockObserver::new(vec![Ok(None)]);
        let task = fixtures::download_task(1000);
        let transfer = async {
            Err(TransferError::ChannelFailure {
                operation: "pull",
                target: "/exportcontainer/d.qcow2".to_string(),
                source: ChannelError::Spawn {
                    program: "sshpass".into(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                },
            })
        }
        .boxed();

        let err = monitor().run(&task, transfer, &observer).await.unwrap_err();
        assert!(matches!(err, TransferError::TransferNeverStarted { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_after_progress_propagates() {
        let observer = MockObserver::new(vec![Ok(Some(10))]);
        let task = fixtures::download_task(1000);
        let transfer = async {
            sleep(Duration::from_secs(6)).await;
            Err(TransferError::TransferIncomplete {
                path: "x".to_string(),
                expected: 1000,
                observed: 10,
            })
        }
        .boxed();

        let err = monitor().run(&task, transfer, &observer).await.unwrap_err();
        assert!(matches!(err, TransferError::TransferIncomplete { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_samples_sent_to_channel() {
        let (tx, mut rx) = mpsc::channel(16);
        let observer = MockObserver::new(vec![Ok(Some(0)), Ok(Some(1000))]);
        let task = fixtures::download_task(1000);

        monitor()
            .with_progress_channel(tx)
            .run(&task, finishes_after(6), &observer)
            .await
            .unwrap();

        let mut received = Vec::new();
        while let Ok(p) = rx.try_recv() {
            received.push(p);
        }
        assert_eq!(received.len(), 3);
        assert!(received[2].is_final);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_file_finishes_at_full_progress() {
        let observer = MockObserver::new(vec![Ok(None), Ok(Some(0))]);
        let task = fixtures::download_task(0);

        let result = monitor()
            .run(&task, finishes_after(6), &observer)
            .await
            .unwrap();

        assert!(result.intermediate_percents().iter().all(|p| *p == 0.0));
        assert_eq!(result.final_percent, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_clamped() {
        let observer = MockObserver::new(vec![Ok(Some(1000))]);
        let task = fixtures::download_task(1000);

        let result = ProgressMonitor::new(Duration::ZERO)
            .run(&task, finishes_after(0), &observer)
            .await
            .unwrap();

        assert_eq!(result.final_percent, 100.0);
    }
}
