//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Scheduling (submissions, admission checks, drain polls)
//! - Transfers (retries, outcomes, bytes, duration)
//!
//! A batch run has no scrape endpoint, so [`write_textfile`] dumps the
//! registry for the node-exporter textfile collector.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::path::Path;

/// Registry holding every core collector.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for collector in all_metrics() {
        // Registration only fails on duplicate names, which all_metrics never yields.
        let _ = registry.register(collector);
    }
    registry
});

// =============================================================================
// Scheduling Metrics
// =============================================================================

/// Conversion jobs submitted by node.
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vmshuttle_jobs_submitted_total",
            "Total conversion jobs submitted to worker nodes",
        ),
        &["node"],
    )
    .unwrap()
});

/// Admission checks by result.
pub static ADMISSION_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vmshuttle_admission_checks_total",
            "Total admission checks against worker nodes",
        ),
        &["result"], // "admitted", "busy"
    )
    .unwrap()
});

/// Completion barrier polls.
pub static DRAIN_POLLS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "vmshuttle_drain_polls_total",
        "Total polls of the pool while waiting for drain",
    )
    .unwrap()
});

// =============================================================================
// Transfer Metrics
// =============================================================================

/// Channel operation retries by operation.
pub static CHANNEL_RETRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vmshuttle_channel_retries_total",
            "Total retries of transient channel failures",
        ),
        &["operation"], // "stat", "push", "pull"
    )
    .unwrap()
});

/// Transfers by direction and result.
pub static TRANSFERS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("vmshuttle_transfers_total", "Total file transfers"),
        &["direction", "result"], // direction: "upload", "download"
    )
    .unwrap()
});

/// Bytes moved by direction.
pub static TRANSFER_BYTES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "vmshuttle_transfer_bytes_total",
            "Total bytes moved by completed transfers",
        ),
        &["direction"],
    )
    .unwrap()
});

/// Transfer duration in seconds.
pub static TRANSFER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "vmshuttle_transfer_duration_seconds",
            "Duration of file transfers",
        )
        .buckets(vec![
            10.0, 30.0, 60.0, 300.0, 900.0, 1800.0, 3600.0, 7200.0, 14400.0,
        ]),
        &["direction"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Scheduling
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(ADMISSION_CHECKS.clone()),
        Box::new(DRAIN_POLLS.clone()),
        // Transfers
        Box::new(CHANNEL_RETRIES.clone()),
        Box::new(TRANSFERS_TOTAL.clone()),
        Box::new(TRANSFER_BYTES.clone()),
        Box::new(TRANSFER_DURATION.clone()),
    ]
}

/// Encode the registry in the text exposition format.
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write the rendered registry to `path`, replacing it atomically.
pub fn write_textfile(path: &Path) -> std::io::Result<()> {
    let body = render().map_err(std::io::Error::other)?;
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)
}
