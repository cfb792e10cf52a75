//! Bounded retry for channel operations.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use super::config::RetryConfig;
use super::error::TransferError;
use crate::channel::ChannelError;
use crate::metrics;

/// The channel operation being retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOp {
    Stat,
    Push,
    Pull,
}

impl ChannelOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelOp::Stat => "stat",
            ChannelOp::Push => "push",
            ChannelOp::Pull => "pull",
        }
    }

    /// Remediation shown when the remote object is missing.
    fn not_found_hint(&self) -> &'static str {
        match self {
            ChannelOp::Stat | ChannelOp::Pull => {
                "the converted image is missing; did you run `vmshuttle convert` first?"
            }
            ChannelOp::Push => "the destination container is missing; create it first",
        }
    }
}

/// Fixed-delay retry with classified failures.
///
/// `NotFound` is a precondition failure and is never retried.
/// `PermissionDenied` and `Unknown` are transient: the transfer server
/// reports "permission denied" while busy. Anything else fails at once.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.delay())
    }

    /// Total attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Runs `attempt` until it succeeds, fails permanently, or the
    /// retry cap is exceeded.
    pub async fn run<T, F, Fut>(
        &self,
        op: ChannelOp,
        target: &str,
        mut attempt: F,
    ) -> Result<T, TransferError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ChannelError>>,
    {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(ChannelError::NotFound { path }) => {
                    return Err(TransferError::precondition_missing(path, op.not_found_hint()))
                }
                Err(e) if e.is_transient() => {
                    if attempts > self.max_retries {
                        return Err(TransferError::RetriesExhausted {
                            operation: op.as_str(),
                            target: target.to_string(),
                            attempts,
                            last_error: e,
                        });
                    }
                    metrics::CHANNEL_RETRIES
                        .with_label_values(&[op.as_str()])
                        .inc();
                    warn!(
                        operation = op.as_str(),
                        target = %target,
                        attempt = attempts,
                        max_attempts = self.max_attempts(),
                        error = %e,
                        "Transient channel failure, retrying"
                    );
                    sleep(self.delay).await;
                }
                Err(e) => {
                    return Err(TransferError::ChannelFailure {
                        operation: op.as_str(),
                        target: target.to_string(),
                        source: e,
                    })
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    /// Fails `transient` times with PermissionDenied, then returns 42.
    async fn flaky(calls: &AtomicU32, transient: u32) -> Result<u64, ChannelError> {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        if n < transient {
            Err(ChannelError::permission_denied("server busy"))
        } else {
            Ok(42)
        }
    }

    async fn missing(calls: &AtomicU32) -> Result<u64, ChannelError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(ChannelError::not_found("/c/f"))
    }

    async fn cannot_spawn(calls: &AtomicU32) -> Result<(), ChannelError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(ChannelError::Spawn {
            program: "sshpass".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_k_transient_failures() {
        for k in 0..=3 {
            let calls = AtomicU32::new(0);
            let value = RetryPolicy::default()
                .run(ChannelOp::Stat, "/c/f", || flaky(&calls, k))
                .await
                .unwrap();
            assert_eq!(value, 42);
            assert_eq!(calls.load(Ordering::SeqCst), k + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_four_attempts() {
        let calls = AtomicU32::new(0);
        let err = RetryPolicy::default()
            .run(ChannelOp::Pull, "/c/f", || flaky(&calls, 10))
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match err {
            TransferError::RetriesExhausted {
                operation,
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(operation, "pull");
                assert_eq!(attempts, 4);
                assert!(last_error.is_transient());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_not_retried() {
        let calls = AtomicU32::new(0);
        let err = RetryPolicy::default()
            .run(ChannelOp::Stat, "/c/f", || missing(&calls))
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, TransferError::PreconditionMissing { .. }));
        assert!(err.to_string().contains("vmshuttle convert"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_between_attempts() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        RetryPolicy::new(3, Duration::from_secs(5))
            .run(ChannelOp::Push, "/c/f", || flaky(&calls, 2))
            .await
            .unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_failure_is_permanent() {
        let calls = AtomicU32::new(0);
        let err = RetryPolicy::default()
            .run(ChannelOp::Push, "/c/f", || cannot_spawn(&calls))
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, TransferError::ChannelFailure { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_means_one_attempt() {
        let calls = AtomicU32::new(0);
        let err = RetryPolicy::new(0, Duration::from_secs(5))
            .run(ChannelOp::Stat, "/c/f", || flaky(&calls, 1))
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, TransferError::RetriesExhausted { attempts: 1, .. }));
    }
}
