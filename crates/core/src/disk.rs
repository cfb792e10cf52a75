//! Disk image naming and boot device checks.
//!
//! Converted images are named `<vm_uuid>_<bus>.<index>.<ext>`, for
//! example `6f0b1c2e-..._scsi.0.qcow2`. The bus and index are the disk's
//! address on the source VM, so the name alone is enough to rebuild the
//! VM's disk layout on the destination cluster.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::pool::Job;

static DISK_IMAGE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-z0-9-]+)_([a-z]+)\.(\d+)\.(qcow2|raw)$").unwrap()
});

/// Where the destination VM expects its boot disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskConfig {
    #[serde(default = "default_boot_bus")]
    pub boot_bus: String,

    #[serde(default)]
    pub boot_index: u32,
}

fn default_boot_bus() -> String {
    "scsi".to_string()
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            boot_bus: default_boot_bus(),
            boot_index: 0,
        }
    }
}

/// Errors from disk image handling.
#[derive(Debug, Error)]
pub enum DiskError {
    /// A VM has no disk at the configured boot address.
    #[error(
        "VM {vm} has no boot disk at {bus}:{index}. \
         Check [disks] boot_bus/boot_index or the exported images"
    )]
    BootDeviceMissing { vm: String, bus: String, index: u32 },

    /// The staging directory holds no disk images.
    #[error("No disk images found in {dir}. Have you downloaded them from the source cluster?")]
    NoImages { dir: String },

    /// The staging directory could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Image file format, from the extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiskFormat {
    Qcow2,
    Raw,
}

impl DiskFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DiskFormat::Qcow2 => "qcow2",
            DiskFormat::Raw => "raw",
        }
    }
}

/// A parsed disk image file name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiskImageName {
    pub vm_uuid: String,
    pub bus: String,
    pub index: u32,
    pub format: DiskFormat,
}

impl DiskImageName {
    /// Parses a file name such as `abc-123_scsi.0.qcow2`.
    pub fn parse(name: &str) -> Option<Self> {
        let caps = DISK_IMAGE_NAME.captures(name)?;
        let format = match &caps[4] {
            "qcow2" => DiskFormat::Qcow2,
            _ => DiskFormat::Raw,
        };
        Some(Self {
            vm_uuid: caps[1].to_string(),
            bus: caps[2].to_string(),
            index: caps[3].parse().ok()?,
            format,
        })
    }

    /// Name for a disk of `vm_uuid` labelled `bus.index`.
    pub fn export_name(vm_uuid: &str, disk_label: &str) -> String {
        format!("{}_{}.{}", vm_uuid, disk_label, DiskFormat::Qcow2.extension())
    }

    /// The same disk in another format.
    pub fn with_format(&self, format: DiskFormat) -> Self {
        Self {
            format,
            ..self.clone()
        }
    }

    /// `bus.index`, as written in VM disk labels.
    pub fn disk_label(&self) -> String {
        format!("{}.{}", self.bus, self.index)
    }

    pub fn file_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DiskImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}.{}.{}",
            self.vm_uuid,
            self.bus,
            self.index,
            self.format.extension()
        )
    }
}

/// Parsed qcow2 images in `dir`, sorted by file name.
pub fn local_images(dir: &Path) -> Result<Vec<(PathBuf, DiskImageName)>, DiskError> {
    let entries = std::fs::read_dir(dir).map_err(|e| DiskError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DiskError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        match DiskImageName::parse(&file_name) {
            Some(name) if name.format == DiskFormat::Qcow2 => images.push((entry.path(), name)),
            _ => debug!(file = %file_name, "Skipping non-image file"),
        }
    }
    images.sort_by(|a, b| a.1.file_name().cmp(&b.1.file_name()));
    Ok(images)
}

/// Import-side conversion jobs for every qcow2 image in `dir`:
/// `X.qcow2` becomes `X.raw` in the import container.
pub fn import_jobs_from_dir(dir: &Path) -> Result<Vec<Job>, DiskError> {
    let images = local_images(dir)?;
    if images.is_empty() {
        return Err(DiskError::NoImages {
            dir: dir.display().to_string(),
        });
    }
    Ok(images
        .into_iter()
        .map(|(_, name)| {
            Job::new(
                name.file_name(),
                name.with_format(DiskFormat::Raw).file_name(),
                name.vm_uuid.clone(),
            )
        })
        .collect())
}

/// Groups disks per VM, sorted by bus then index, and checks each VM
/// has a disk at the configured boot address.
pub fn verify_boot_devices<'a>(
    names: impl IntoIterator<Item = &'a DiskImageName>,
    config: &DiskConfig,
) -> Result<BTreeMap<String, Vec<DiskImageName>>, DiskError> {
    let mut by_vm: BTreeMap<String, Vec<DiskImageName>> = BTreeMap::new();
    for name in names {
        by_vm.entry(name.vm_uuid.clone()).or_default().push(name.clone());
    }

    for (vm, disks) in by_vm.iter_mut() {
        disks.sort_by(|a, b| a.bus.cmp(&b.bus).then(a.index.cmp(&b.index)));
        let has_boot = disks
            .iter()
            .any(|d| d.bus == config.boot_bus && d.index == config.boot_index);
        if !has_boot {
            return Err(DiskError::BootDeviceMissing {
                vm: vm.clone(),
                bus: config.boot_bus.clone(),
                index: config.boot_index,
            });
        }
    }

    Ok(by_vm)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VM: &str = "6f0b1c2e-9d3a-4c1b-8e7f-0a1b2c3d4e5f";

    #[test]
    fn test_parse_disk_name() {
        let name = DiskImageName::parse(&format!("{VM}_scsi.1.qcow2")).unwrap();
        assert_eq!(name.vm_uuid, VM);
        assert_eq!(name.bus, "scsi");
        assert_eq!(name.index, 1);
        assert_eq!(name.format, DiskFormat::Qcow2);
        assert_eq!(name.disk_label(), "scsi.1");
        assert_eq!(name.file_name(), format!("{VM}_scsi.1.qcow2"));
    }

    #[test]
    fn test_parse_rejects_other_files() {
        assert!(DiskImageName::parse(&format!("{VM}.cfg")).is_none());
        assert!(DiskImageName::parse(&format!("{VM}_scsi.0.qcow2.filepart")).is_none());
        assert!(DiskImageName::parse("notes.txt").is_none());
    }

    #[test]
    fn test_export_name_round_trips_through_parse() {
        let file = DiskImageName::export_name(VM, "ide.2");
        let parsed = DiskImageName::parse(&file).unwrap();
        assert_eq!(parsed.bus, "ide");
        assert_eq!(parsed.index, 2);
    }

    #[test]
    fn test_import_jobs_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        for file in [
            format!("{VM}_scsi.1.qcow2"),
            format!("{VM}_scsi.0.qcow2"),
            format!("{VM}.cfg"),
            "README".to_string(),
        ] {
            std::fs::write(dir.path().join(file), b"x").unwrap();
        }

        let jobs = import_jobs_from_dir(dir.path()).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].source_locator, format!("{VM}_scsi.0.qcow2"));
        assert_eq!(jobs[0].destination_name, format!("{VM}_scsi.0.raw"));
        assert_eq!(jobs[0].owner_label, VM);
    }

    #[test]
    fn test_import_jobs_from_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_jobs_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, DiskError::NoImages { .. }));
    }

    #[test]
    fn test_verify_boot_devices() {
        let names: Vec<_> = ["ide.0", "scsi.1", "scsi.0"]
            .iter()
            .map(|label| DiskImageName::parse(&DiskImageName::export_name(VM, label)).unwrap())
            .collect();

        let grouped = verify_boot_devices(&names, &DiskConfig::default()).unwrap();
        let labels: Vec<_> = grouped[VM].iter().map(|d| d.disk_label()).collect();
        assert_eq!(labels, vec!["ide.0", "scsi.0", "scsi.1"]);
    }

    #[test]
    fn test_missing_boot_device() {
        let names = vec![DiskImageName::parse(&format!("{VM}_scsi.1.raw")).unwrap()];
        let err = verify_boot_devices(&names, &DiskConfig::default()).unwrap_err();
        match err {
            DiskError::BootDeviceMissing { vm, bus, index } => {
                assert_eq!(vm, VM);
                assert_eq!(bus, "scsi");
                assert_eq!(index, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
