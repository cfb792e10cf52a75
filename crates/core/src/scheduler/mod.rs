//! Job placement and completion detection for conversion waves.
//!
//! [`JobScheduler`] places pending jobs round-robin on nodes whose live
//! running-job count is within the cap. [`CompletionBarrier`] then
//! polls the pool until nothing is running. [`run_wave`] does both
//! inside one `wave` span.
//!
//! # Example
//!
//! ```ignore
//! use shuttle_core::scheduler::{run_wave, SchedulerConfig};
//!
//! let report = run_wave(&pool, &jobs, &SchedulerConfig::default()).await?;
//! for (node, count) in report.jobs_per_node() {
//!     println!("{node}: {count} jobs");
//! }
//! ```

mod barrier;
mod config;
mod error;
mod placement;
mod types;
mod wave;

pub use barrier::CompletionBarrier;
pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use placement::JobScheduler;
pub use types::{DrainReport, PlacementRecord, WaveReport};
pub use wave::run_wave;
