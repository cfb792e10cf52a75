//! Transfer channel for moving disk images between clusters.
//!
//! This module provides the `TransferChannel` trait, the SFTP
//! implementation used against cluster storage containers, and the
//! output classifiers that turn `sftp` text into typed outcomes.
//!
//! # Example
//!
//! ```ignore
//! use shuttle_core::channel::{SftpChannel, SftpConfig, TransferChannel};
//!
//! let channel = SftpChannel::new(SftpConfig {
//!     host: "10.0.0.10".to_string(),
//!     username: "restapiuser".to_string(),
//!     ..Default::default()
//! });
//!
//! let size = channel.stat("/exportcontainer/vm1_scsi.0.qcow2").await?;
//! channel.pull("/exportcontainer/vm1_scsi.0.qcow2", Path::new("/data/vm1_scsi.0.qcow2")).await?;
//! ```

mod config;
mod error;
mod parse;
mod sftp;
mod traits;

pub use config::{SftpConfig, LARGE_BUFFER_BYTES};
pub use error::ChannelError;
pub use parse::{classify_copy_output, parse_ls_output};
pub use sftp::SftpChannel;
pub use traits::TransferChannel;
