pub mod channel;
pub mod config;
pub mod directory;
pub mod disk;
pub mod manifest;
pub mod metrics;
pub mod pool;
pub mod preflight;
pub mod scheduler;
pub mod testing;
pub mod transfer;

pub use channel::{ChannelError, SftpChannel, SftpConfig, TransferChannel};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    Secret,
};
pub use directory::{ClusterConfig, ClusterDirectory, ComputeNode, DirectoryError, PrismDirectory};
pub use disk::{
    import_jobs_from_dir, verify_boot_devices, DiskConfig, DiskError, DiskFormat, DiskImageName,
};
pub use manifest::{load_plan, load_vm_manifest, ManifestError, Plan};
pub use pool::{
    ConversionCommand, ConversionConfig, ConversionMode, Job, PoolError, RemoteExec,
    RemoteWorkerPool, SshExec, WorkerConfig, WorkerNode, WorkerPool,
};
pub use preflight::{check_port, PreflightError};
pub use scheduler::{
    run_wave, CompletionBarrier, JobScheduler, SchedulerConfig, SchedulerError, WaveReport,
};
pub use transfer::{
    ProgressMonitor, RetryPolicy, TransferConfig, TransferError, TransferPipeline,
    TransferResult,
};
