//! Worker pool: the compute nodes that run disk conversions.
//!
//! A [`WorkerPool`] exposes a stable list of [`WorkerNode`]s, reports how
//! many conversion jobs each node is running right now, and starts new
//! jobs without waiting for them. [`RemoteWorkerPool`] implements it on
//! top of any [`RemoteExec`]; [`SshExec`] is the production executor.
//!
//! # Example
//!
//! ```ignore
//! use shuttle_core::pool::{RemoteWorkerPool, SshExec, WorkerPool};
//!
//! let pool = RemoteWorkerPool::from_directory(
//!     Some(&directory),
//!     SshExec::new(config.workers.clone()),
//!     &config.workers,
//!     config.conversion.clone(),
//! )
//! .await?;
//!
//! for node in pool.nodes() {
//!     println!("{}: {}", node, pool.running_job_count(node).await?);
//! }
//! ```

mod command;
mod config;
mod error;
mod parse;
mod remote;
mod ssh;
mod traits;
mod types;

pub use command::{shell_quote, ConversionCommand};
pub use config::{ConversionConfig, ConversionMode, WorkerConfig};
pub use error::PoolError;
pub use parse::count_matching_processes;
pub use remote::RemoteWorkerPool;
pub use ssh::SshExec;
pub use traits::{detach, CommandOutput, RemoteExec, WorkerPool};
pub use types::{Credential, Job, WorkerNode};
