//! Resilient file transfers with live progress.
//!
//! Channel operations run under a [`RetryPolicy`]; the copy itself runs
//! as its own task while a [`ProgressMonitor`] samples the destination
//! size. [`TransferPipeline`] ties both to one remote container.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use shuttle_core::channel::SftpChannel;
//! use shuttle_core::transfer::TransferPipeline;
//!
//! let channel = Arc::new(SftpChannel::new(config.channel.clone()));
//! let pipeline = TransferPipeline::new(channel, config.transfer.clone(), "exportcontainer");
//! let result = pipeline.download("vm_scsi.0.qcow2", "web01").await?;
//! println!("{} bytes in {:?}", result.observed_bytes, result.elapsed);
//! ```

mod config;
mod error;
mod monitor;
mod observer;
mod pipeline;
mod retry;
mod types;

pub use config::{RetryConfig, TransferConfig};
pub use error::TransferError;
pub use monitor::ProgressMonitor;
pub use observer::{DestinationObserver, LocalFileObserver, RemoteObserver};
pub use pipeline::TransferPipeline;
pub use retry::{ChannelOp, RetryPolicy};
pub use types::{percent_of, TransferDirection, TransferProgress, TransferResult, TransferTask};
