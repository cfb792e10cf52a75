//! Cluster discovery.
//!
//! A [`ClusterDirectory`] lists the nodes of a cluster; the worker pool
//! keeps only the coordinator nodes. [`PrismDirectory`] reads the
//! management REST API.

mod config;
mod error;
mod prism;
mod traits;
mod types;

pub use config::ClusterConfig;
pub use error::DirectoryError;
pub use prism::PrismDirectory;
pub use traits::ClusterDirectory;
pub use types::ComputeNode;
