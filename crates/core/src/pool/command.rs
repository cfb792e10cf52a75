//! Construction of the remote `qemu-img convert` command line.

use super::config::{ConversionConfig, ConversionMode};
use super::types::Job;

/// Builds the conversion command run on a worker node for one job.
#[derive(Debug, Clone)]
pub struct ConversionCommand {
    config: ConversionConfig,
}

impl ConversionCommand {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Builds the argument vector, without the program path.
    pub fn build_args(&self, job: &Job) -> Vec<String> {
        let mut args = vec!["convert".to_string()];

        match self.config.mode {
            ConversionMode::Export => {
                if self.config.compress {
                    args.push("-c".to_string());
                }
                args.extend([
                    "-f".to_string(),
                    "raw".to_string(),
                    self.nfs_url(&job.source_locator),
                    "-O".to_string(),
                    "qcow2".to_string(),
                    self.container_url(&self.config.export_container, &job.destination_name),
                ]);
            }
            ConversionMode::Import => {
                let container = &self.config.import_container;
                args.extend([
                    "-f".to_string(),
                    "qcow2".to_string(),
                    self.container_url(container, &job.source_locator),
                    "-O".to_string(),
                    "raw".to_string(),
                    self.container_url(container, &job.destination_name),
                ]);
            }
        }

        args
    }

    /// Builds the full shell command line with every argument quoted.
    pub fn build(&self, job: &Job) -> String {
        let mut parts = vec![shell_quote(&self.config.qemu_img_path)];
        parts.extend(self.build_args(job).iter().map(|a| shell_quote(a)));
        parts.join(" ")
    }

    /// Source locators may already be full NFS URLs.
    fn nfs_url(&self, path: &str) -> String {
        if path.starts_with("nfs://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("nfs://{}{}", self.config.nfs_host, path)
        } else {
            format!("nfs://{}/{}", self.config.nfs_host, path)
        }
    }

    fn container_url(&self, container: &str, name: &str) -> String {
        format!(
            "nfs://{}/{}/{}",
            self.config.nfs_host,
            container.trim_matches('/'),
            name.trim_start_matches('/')
        )
    }
}

/// Quotes a string for a POSIX shell.
///
/// Strings made only of safe characters are returned unchanged.
pub fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | ':' | '='));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new(
            "/ctr1/.acropolis/vmdisk/1111-2222",
            "vm-uuid_scsi.0.qcow2",
            "web01",
        )
    }

    #[test]
    fn test_export_command() {
        let cmd = ConversionCommand::new(ConversionConfig::new(ConversionMode::Export));
        assert_eq!(
            cmd.build(&job()),
            "/usr/local/nutanix/bin/qemu-img convert -f raw \
             nfs://127.0.0.1/ctr1/.acropolis/vmdisk/1111-2222 -O qcow2 \
             nfs://127.0.0.1/exportcontainer/vm-uuid_scsi.0.qcow2"
        );
    }

    #[test]
    fn test_export_command_with_compression() {
        let cmd = ConversionCommand::new(
            ConversionConfig::new(ConversionMode::Export).with_compression(true),
        );
        let args = cmd.build_args(&job());
        assert_eq!(args[0], "convert");
        assert_eq!(args[1], "-c");
    }

    #[test]
    fn test_import_command() {
        let cmd = ConversionCommand::new(ConversionConfig::new(ConversionMode::Import));
        let job = Job::new("vm-uuid_scsi.0.qcow2", "vm-uuid_scsi.0.raw", "web01");
        let args = cmd.build_args(&job);
        assert_eq!(
            args,
            vec![
                "convert",
                "-f",
                "qcow2",
                "nfs://127.0.0.1/sftpcontainer/vm-uuid_scsi.0.qcow2",
                "-O",
                "raw",
                "nfs://127.0.0.1/sftpcontainer/vm-uuid_scsi.0.raw",
            ]
        );
    }

    #[test]
    fn test_import_ignores_compression() {
        let cmd = ConversionCommand::new(
            ConversionConfig::new(ConversionMode::Import).with_compression(true),
        );
        let job = Job::new("a.qcow2", "a.raw", "vm");
        assert!(!cmd.build_args(&job).contains(&"-c".to_string()));
    }

    #[test]
    fn test_full_nfs_url_source_kept() {
        let cmd = ConversionCommand::new(ConversionConfig::new(ConversionMode::Export));
        let job = Job::new("nfs://10.0.0.5/ctr/disk", "d.qcow2", "vm");
        assert!(cmd.build(&job).contains(" nfs://10.0.0.5/ctr/disk "));
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plain/path.qcow2"), "plain/path.qcow2");
        assert_eq!(shell_quote("with space"), "'with space'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("a;rm -rf /"), "'a;rm -rf /'");
    }
}
