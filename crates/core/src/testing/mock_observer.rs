//! Mock destination observer for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::channel::ChannelError;
use crate::transfer::DestinationObserver;

/// Mock implementation of the DestinationObserver trait.
///
/// Answers from a script, one entry per sample. Once the script runs
/// out, the last successful answer repeats.
#[derive(Debug)]
pub struct MockObserver {
    script: Arc<RwLock<VecDeque<Result<Option<u64>, ChannelError>>>>,
    last: Arc<RwLock<Option<u64>>>,
    calls: Arc<RwLock<usize>>,
}

impl MockObserver {
    /// Create a mock observer answering from `script`.
    pub fn new(script: Vec<Result<Option<u64>, ChannelError>>) -> Self {
        Self {
            script: Arc::new(RwLock::new(script.into())),
            last: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(0)),
        }
    }

    /// Number of samples taken.
    pub async fn calls(&self) -> usize {
        *self.calls.read().await
    }
}

#[async_trait]
impl DestinationObserver for MockObserver {
    async fn observed_size(&self) -> Result<Option<u64>, ChannelError> {
        *self.calls.write().await += 1;
        match self.script.write().await.pop_front() {
            Some(Ok(size)) => {
                *self.last.write().await = size;
                Ok(size)
            }
            Some(Err(e)) => Err(e),
            None => Ok(*self.last.read().await),
        }
    }
}
