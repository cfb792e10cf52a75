//! Configuration loading.
//!
//! One TOML file, overridden by `VMSHUTTLE_*` environment variables with
//! `__` between nesting levels. Each section's struct lives beside the
//! module that consumes it; [`Config`] only gathers them.

mod loader;
mod types;
mod validate;

pub use loader::{load_config, load_config_from_str, ENV_PREFIX};
pub use types::*;
pub use validate::validate_config;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}. Pass --config or set VMSHUTTLE_CONFIG")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}
