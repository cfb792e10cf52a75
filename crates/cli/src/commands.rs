//! Subcommand definitions and handlers.
//!
//! Every handler builds its collaborators from the loaded [`Config`] and
//! returns on the first fatal error; nothing is retried at this level.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, ensure, Context, Result};
use clap::{Args, Subcommand};
use tracing::{info, warn};

use shuttle_core::{
    check_port,
    disk::local_images,
    import_jobs_from_dir, load_plan, load_vm_manifest, run_wave, verify_boot_devices,
    ClusterDirectory, Config, ConversionMode, DiskError, DiskImageName, Job, Plan,
    PrismDirectory, RemoteWorkerPool, SanitizedConfig, SftpChannel, SshExec, TransferPipeline,
    TransferResult, WorkerPool,
};

/// How long the preflight waits for the channel port to answer.
const PREFLIGHT_TIMEOUT: Duration = Duration::from_secs(10);

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// List worker nodes and the conversions running on each.
    Nodes,

    /// Check the cluster directory and the transfer port are reachable.
    Check,

    /// Run one conversion wave and wait for it to drain.
    ///
    /// In import mode the jobs default to every disk image in the local
    /// staging directory.
    Convert(ConvertArgs),

    /// Pull every converted image of a plan into the staging directory.
    Download(DownloadArgs),

    /// Push every staged disk image to the import container.
    Upload(UploadArgs),

    /// Print the configuration with secrets redacted.
    ShowConfig,
}

/// Arguments for `vmshuttle convert`.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Wave plan (TOML `[[jobs]]`). Required in export mode.
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// CSV manifest; only jobs owned by the VMs in its first column run.
    #[arg(long)]
    pub only: Option<PathBuf>,
}

/// Arguments for `vmshuttle download`.
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Wave plan whose destinations are downloaded.
    #[arg(long)]
    pub plan: PathBuf,

    /// CSV manifest restricting the plan to some VMs.
    #[arg(long)]
    pub only: Option<PathBuf>,
}

/// Arguments for `vmshuttle upload`.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// CSV manifest of VM uuids to upload.
    #[arg(long)]
    pub only: Option<PathBuf>,
}

/// Run one subcommand against `config`.
pub async fn execute(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Nodes => nodes(config).await,
        Command::Check => check(config).await,
        Command::Convert(args) => convert(config, args).await,
        Command::Download(args) => download(config, args).await,
        Command::Upload(args) => upload(config, args).await,
        Command::ShowConfig => show_config(config),
    }
}

async fn nodes(config: &Config) -> Result<()> {
    let pool = build_pool(config).await?;
    for node in pool.nodes() {
        let running = pool
            .running_job_count(node)
            .await
            .with_context(|| format!("Failed to query {}", node))?;
        println!("{}\t{} running", node.address, running);
    }
    Ok(())
}

async fn check(config: &Config) -> Result<()> {
    if config.cluster.address.is_empty() {
        info!("No [cluster] address configured, skipping directory check");
    } else {
        let directory = PrismDirectory::new(config.cluster.clone())
            .context("Failed to create directory client")?;
        let found = directory
            .list_compute_nodes()
            .await
            .context("Cluster directory check failed")?;
        println!(
            "directory {}: {} compute nodes",
            config.cluster.address,
            found.len()
        );
    }

    ensure!(
        !config.channel.host.is_empty(),
        "No [channel] host configured; set it to the cluster virtual IP"
    );
    check_port(&config.channel.host, config.channel.port, PREFLIGHT_TIMEOUT).await?;
    println!(
        "channel {}:{}: open",
        config.channel.host, config.channel.port
    );
    Ok(())
}

async fn convert(config: &Config, args: ConvertArgs) -> Result<()> {
    let import = config.conversion.mode == ConversionMode::Import;
    let jobs = match &args.plan {
        Some(path) => load_plan(path)?.jobs,
        None if import => import_jobs_from_dir(&config.transfer.local_dir)?,
        None => bail!("Export waves need a plan: pass --plan FILE"),
    };
    let jobs = restrict_to_manifest(jobs, args.only.as_deref())?;
    if jobs.is_empty() {
        warn!("No jobs left to convert");
        return Ok(());
    }

    let pool = build_pool(config).await?;
    let report = run_wave(&pool, &jobs, &config.scheduler)
        .await
        .context("Conversion wave failed")?;

    for (node, count) in report.jobs_per_node() {
        println!("{}\t{} jobs", node, count);
    }
    println!(
        "wave {}: {} jobs drained after {} polls",
        report.wave_id,
        report.placements.len(),
        report.drain.polls
    );

    if import {
        let names: Vec<DiskImageName> = jobs
            .iter()
            .filter_map(|job| DiskImageName::parse(&job.destination_name))
            .collect();
        let vms = verify_boot_devices(&names, &config.disks)?;
        for (vm, disks) in &vms {
            let labels: Vec<String> = disks.iter().map(DiskImageName::disk_label).collect();
            info!(vm = %vm, disks = %labels.join(","), "Boot device present");
        }
    }
    Ok(())
}

async fn download(config: &Config, args: DownloadArgs) -> Result<()> {
    ensure!(
        config.conversion.mode == ConversionMode::Export,
        "Downloads read the export container; set [conversion] mode = \"export\""
    );
    let jobs = restrict_to_manifest(load_plan(&args.plan)?.jobs, args.only.as_deref())?;

    let results = transfer_pipeline(config)
        .download_all(&jobs)
        .await
        .context("Download aborted")?;
    print_results(&results);
    Ok(())
}

async fn upload(config: &Config, args: UploadArgs) -> Result<()> {
    ensure!(
        config.conversion.mode == ConversionMode::Import,
        "Uploads fill the import container; set [conversion] mode = \"import\""
    );
    let dir = &config.transfer.local_dir;
    let mut files: Vec<(PathBuf, String)> = local_images(dir)?
        .into_iter()
        .map(|(path, name)| (path, name.vm_uuid))
        .collect();

    if let Some(manifest) = &args.only {
        let owners: HashSet<String> = load_vm_manifest(manifest)?.into_iter().collect();
        files.retain(|(_, owner)| owners.contains(owner));
    }
    if files.is_empty() {
        return Err(DiskError::NoImages {
            dir: dir.display().to_string(),
        }
        .into());
    }

    let results = transfer_pipeline(config)
        .upload_all(&files)
        .await
        .context("Upload aborted")?;
    print_results(&results);
    Ok(())
}

fn show_config(config: &Config) -> Result<()> {
    let sanitized = SanitizedConfig::from(config);
    println!("{}", serde_json::to_string_pretty(&sanitized)?);
    Ok(())
}

/// Worker pool from the static `[workers].addresses`, or discovered
/// through the cluster directory when that list is empty.
async fn build_pool(config: &Config) -> Result<RemoteWorkerPool<SshExec>> {
    let directory = if config.workers.addresses.is_empty() && !config.cluster.address.is_empty()
    {
        Some(
            PrismDirectory::new(config.cluster.clone())
                .context("Failed to create directory client")?,
        )
    } else {
        None
    };

    RemoteWorkerPool::from_directory(
        directory.as_ref().map(|d| d as &dyn ClusterDirectory),
        SshExec::new(config.workers.clone()),
        &config.workers,
        config.conversion.clone(),
    )
    .await
    .context("Failed to assemble worker pool")
}

fn transfer_pipeline(config: &Config) -> TransferPipeline {
    let channel = Arc::new(SftpChannel::new(config.channel.clone()));
    TransferPipeline::new(
        channel,
        config.transfer.clone(),
        config.conversion.transfer_container(),
    )
}

fn restrict_to_manifest(jobs: Vec<Job>, manifest: Option<&Path>) -> Result<Vec<Job>> {
    let Some(path) = manifest else {
        return Ok(jobs);
    };
    let owners = load_vm_manifest(path)?;
    let plan = Plan { jobs }.filter_by_owners(&owners);
    info!(owners = owners.len(), jobs = plan.jobs.len(), "Restricted to manifest");
    Ok(plan.jobs)
}

fn print_results(results: &[TransferResult]) {
    for result in results {
        println!(
            "{}\t{} bytes\t{}s",
            result.task.destination_path,
            result.observed_bytes,
            result.elapsed.as_secs()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn job(owner: &str) -> Job {
        Job::new(
            format!("/ctr1/.acropolis/vmdisk/{owner}"),
            format!("{owner}_scsi.0.qcow2"),
            owner,
        )
    }

    #[test]
    fn test_restrict_without_manifest_keeps_everything() {
        let jobs = restrict_to_manifest(vec![job("a"), job("b")], None).unwrap();
        assert_eq!(jobs.len(), 2);
    }

    #[test]
    fn test_restrict_to_manifest() {
        let mut manifest = NamedTempFile::new().unwrap();
        writeln!(manifest, "b,prod").unwrap();

        let jobs = restrict_to_manifest(vec![job("a"), job("b")], Some(manifest.path())).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].owner_label, "b");
    }
}
