use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Conversion section exists (enforced by serde)
/// - Per-node job cap is at least 1
/// - Polling intervals are not 0
/// - Channel port is not 0
/// - Container names are not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.scheduler.max_jobs_per_node == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.max_jobs_per_node must be at least 1".to_string(),
        ));
    }

    let intervals = [
        ("scheduler.admission_delay_ms", config.scheduler.admission_delay_ms),
        ("scheduler.drain_interval_ms", config.scheduler.drain_interval_ms),
        ("transfer.progress_interval_ms", config.transfer.progress_interval_ms),
    ];
    if let Some((name, _)) = intervals.iter().find(|(_, value)| *value == 0) {
        return Err(ConfigError::ValidationError(format!("{} cannot be 0", name)));
    }

    if config.channel.port == 0 {
        return Err(ConfigError::ValidationError(
            "channel.port cannot be 0".to_string(),
        ));
    }

    if config.conversion.export_container.trim().is_empty()
        || config.conversion.import_container.trim().is_empty()
    {
        return Err(ConfigError::ValidationError(
            "conversion container names cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn base_config() -> Config {
        load_config_from_str(
            r#"
[conversion]
mode = "export"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_validate_zero_cap_fails() {
        let mut config = base_config();
        config.scheduler.max_jobs_per_node = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_interval_fails() {
        let mut config = base_config();
        config.transfer.progress_interval_ms = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("transfer.progress_interval_ms"));
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = base_config();
        config.channel.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_container_fails() {
        let mut config = base_config();
        config.conversion.export_container = " ".to_string();
        assert!(validate_config(&config).is_err());
    }
}
