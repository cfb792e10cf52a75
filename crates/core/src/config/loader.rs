use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment variable overrides, e.g.
/// `VMSHUTTLE_SCHEDULER__MAX_JOBS_PER_NODE=4`.
pub const ENV_PREFIX: &str = "VMSHUTTLE_";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::ConversionMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[conversion]
mode = "export"

[scheduler]
max_jobs_per_node = 2
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.conversion.mode, ConversionMode::Export);
        assert_eq!(config.scheduler.max_jobs_per_node, 2);
        assert_eq!(config.channel.port, 2222);
        assert_eq!(config.transfer.retry.max_retries, 3);
    }

    #[test]
    fn test_load_config_from_str_missing_conversion() {
        let toml = r#"
[scheduler]
max_jobs_per_node = 6
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/vmshuttle.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[conversion]
mode = "import"
import_container = "sftpcontainer"

[channel]
host = "10.1.1.1"
username = "restapiuser"
password = "blahblah"

[transfer]
local_dir = "/srv/export"

[transfer.retry]
max_retries = 5
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.conversion.mode, ConversionMode::Import);
        assert_eq!(config.channel.host, "10.1.1.1");
        assert_eq!(config.channel.password.expose(), "blahblah");
        assert_eq!(config.transfer.local_dir.to_string_lossy(), "/srv/export");
        assert_eq!(config.transfer.retry.max_retries, 5);
    }
}
