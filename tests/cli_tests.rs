//! CLI integration tests. No backend is contacted: every test runs against
//! an empty or template-only config directory.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;

/// Binary with `--settings` pointing at a missing file and `--config-dir`
/// inside `dir`.
fn stackwatch(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("stackwatch");
    cmd.env_remove("STACKWATCH_CONFIG_DIR")
        .env_remove("STACKWATCH_CLUSTER_PASSWORD")
        .arg("--settings")
        .arg(dir.join("missing.toml"))
        .arg("--config-dir")
        .arg(dir.join("configs"));
    cmd
}

#[test]
fn help_lists_commands() {
    cargo_bin_cmd!("stackwatch")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("stackwatch"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("metrics"))
        .stdout(predicate::str::contains("cluster"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn version_names_binary() {
    cargo_bin_cmd!("stackwatch")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stackwatch"));
}

#[test]
fn config_init_writes_every_family_then_validates() {
    let dir = tempfile::tempdir().unwrap();

    stackwatch(dir.path())
        .args(["--json", "config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.init"))
        .stdout(predicate::str::contains("redis.toml"));

    for file in ["redis.toml", "kafka.toml", "postgresql.toml", "mysql.toml"] {
        assert!(dir.path().join("configs").join(file).exists(), "{file} missing");
    }

    stackwatch(dir.path())
        .args(["config", "validate"])
        .assert()
        .success();
}

#[test]
fn config_init_keeps_existing_documents() {
    let dir = tempfile::tempdir().unwrap();
    let configs = dir.path().join("configs");
    fs::create_dir_all(&configs).unwrap();
    fs::write(configs.join("redis.toml"), "# mine\n").unwrap();

    stackwatch(dir.path())
        .args(["config", "init"])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(configs.join("redis.toml")).unwrap(), "# mine\n");
}

#[test]
fn config_validate_fails_on_invalid_family() {
    let dir = tempfile::tempdir().unwrap();
    let configs = dir.path().join("configs");
    fs::create_dir_all(&configs).unwrap();
    fs::write(configs.join("kafka.toml"), "[kafka]\nname = \"main\"\nbrokers = []\n").unwrap();

    stackwatch(dir.path())
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("kafka.brokers"));
}

#[test]
fn invalid_settings_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let settings = dir.path().join("stackwatch.toml");
    fs::write(&settings, "[monitoring]\nrequest_timeout_ms = 0\n").unwrap();

    cargo_bin_cmd!("stackwatch")
        .env_remove("STACKWATCH_CONFIG_DIR")
        .arg("--settings")
        .arg(&settings)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("request_timeout_ms"));
}

#[test]
fn status_json_with_no_instances() {
    let dir = tempfile::tempdir().unwrap();

    stackwatch(dir.path())
        .args(["--json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"families\""))
        .stdout(predicate::str::contains("\"disconnected\""));
}

#[test]
fn metrics_json_with_no_instances() {
    let dir = tempfile::tempdir().unwrap();

    stackwatch(dir.path())
        .args(["--json", "metrics"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"summary\""))
        .stdout(predicate::str::contains("\"total_services\":0"));
}

#[test]
fn cluster_without_addresses_fails() {
    let dir = tempfile::tempdir().unwrap();

    stackwatch(dir.path())
        .arg("cluster")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no cluster addresses"));
}

#[test]
fn metrics_count_requires_watch() {
    let dir = tempfile::tempdir().unwrap();

    stackwatch(dir.path())
        .args(["metrics", "--count", "2"])
        .assert()
        .failure();
}
