mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use shuttle_core::{load_config, metrics, validate_config};

use commands::Command;

/// Migrate VM disks between clusters.
#[derive(Parser)]
#[command(name = "vmshuttle")]
#[command(about = "Convert VM disks on cluster worker nodes and move them between clusters")]
#[command(version)]
struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Command,

    /// Configuration file.
    #[arg(
        short,
        long,
        env = "VMSHUTTLE_CONFIG",
        default_value = "vmshuttle.toml",
        global = true
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level. Logs go to stderr so command
    // output on stdout stays machine readable.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Loading configuration from {:?}", cli.config);
    let config = load_config(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;

    validate_config(&config).context("Configuration validation failed")?;
    info!(mode = config.conversion.mode.as_str(), "Configuration loaded");

    let outcome = commands::execute(cli.command, &config).await;

    // Written on failure too, so a partial wave still shows up.
    if let Some(path) = &config.metrics.textfile_path {
        match metrics::write_textfile(path) {
            Ok(()) => info!("Metrics written to {:?}", path),
            Err(e) => warn!("Failed to write metrics to {:?}: {}", path, e),
        }
    }

    outcome
}
