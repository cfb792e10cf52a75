use std::io::Write;
use std::process::Output;

use tempfile::NamedTempFile;

/// Create a config with every secret set
fn config_with_secrets() -> String {
    r#"
[conversion]
mode = "export"

[cluster]
address = "10.1.0.10"
password = "rest-secret"

[workers]
password = "cvm-secret"
addresses = ["10.1.0.11", "10.1.0.12"]

[channel]
host = "10.1.0.10"
username = "admin"
password = "sftp-secret"
"#
    .to_string()
}

/// Run the binary with the given config path and arguments
async fn run_cli(config_path: &std::path::Path, args: &[&str]) -> Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_vmshuttle"))
        .env("VMSHUTTLE_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .args(args)
        .output()
        .await
        .expect("Failed to run vmshuttle")
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[tokio::test]
async fn test_show_config_redacts_secrets() {
    let config = write_config(&config_with_secrets());

    let output = run_cli(config.path(), &["show-config"]).await;
    assert!(output.status.success(), "show-config failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("rest-secret"));
    assert!(!stdout.contains("cvm-secret"));
    assert!(!stdout.contains("sftp-secret"));

    let json: serde_json::Value = serde_json::from_str(&stdout).expect("stdout is JSON");
    assert_eq!(json["conversion"]["mode"], "export");
    assert_eq!(json["workers"]["password_configured"], true);
    assert_eq!(json["channel"]["port"], 2222);
    assert_eq!(json["scheduler"]["max_jobs_per_node"], 6);
}

#[tokio::test]
async fn test_missing_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let output = run_cli(&missing, &["show-config"]).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[tokio::test]
async fn test_invalid_config_fails() {
    let config = write_config(
        &(config_with_secrets() + "\n[scheduler]\nmax_jobs_per_node = 0\n"),
    );

    let output = run_cli(config.path(), &["show-config"]).await;
    assert_eq!(output.status.code(), Some(1));
}

#[tokio::test]
async fn test_export_convert_requires_plan() {
    let config = write_config(&config_with_secrets());

    let output = run_cli(config.path(), &["convert"]).await;
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--plan"), "stderr: {}", stderr);
}

#[tokio::test]
async fn test_env_overrides_file() {
    let config = write_config(&config_with_secrets());

    let output = tokio::process::Command::new(env!("CARGO_BIN_EXE_vmshuttle"))
        .env("VMSHUTTLE_CONFIG", config.path())
        .env("VMSHUTTLE_SCHEDULER__MAX_JOBS_PER_NODE", "3")
        .env("RUST_LOG", "error")
        .arg("show-config")
        .output()
        .await
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["scheduler"]["max_jobs_per_node"], 3);
}
