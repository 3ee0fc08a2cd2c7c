//! Configuration integration tests.
//!
//! These tests verify config discovery, format parsing, and precedence
//! from an end-to-end perspective using the compiled binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// Run the binary from `dir` with the user config directory pointed at `home`.
fn cmd_in(home: &TempDir, dir: &Path) -> Command {
    let mut cmd = cmd();
    cmd.current_dir(dir)
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

/// `info --json` output for a run from `dir`.
fn info_json(home: &TempDir, dir: &Path) -> serde_json::Value {
    let output = cmd_in(home, dir)
        .args(["info", "--offline", "--json"])
        .assert()
        .success();
    serde_json::from_slice(&output.get_output().stdout).unwrap()
}

// =============================================================================
// Config File Discovery
// =============================================================================

#[test]
fn runs_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let json = info_json(&tmp, tmp.path());
    assert!(json["config"].get("config_file").is_none());
}

#[test]
fn discovers_dotfile_config_in_current_dir() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".stackctl.toml"), r#"logLevel = "debug""#).unwrap();

    let json = info_json(&tmp, tmp.path());
    assert_eq!(json["config"]["log_level"], "debug");
}

#[test]
fn discovers_config_in_parent_directory() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("nested").join("deep");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(tmp.path().join(".stackctl.toml"), r#"logLevel = "warn""#).unwrap();

    let json = info_json(&tmp, &sub_dir);
    assert_eq!(json["config"]["log_level"], "warn");
}

#[test]
fn closer_config_takes_precedence() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("project");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(tmp.path().join(".stackctl.toml"), r#"logLevel = "error""#).unwrap();
    fs::write(sub_dir.join(".stackctl.toml"), r#"logLevel = "debug""#).unwrap();

    let json = info_json(&tmp, &sub_dir);
    assert_eq!(json["config"]["log_level"], "debug");
}

#[test]
fn git_boundary_stops_config_search() {
    let tmp = TempDir::new().unwrap();
    let parent = tmp.path().join("parent");
    let repo = parent.join("repo");
    let src = repo.join("src");
    fs::create_dir_all(&src).unwrap();
    fs::create_dir(repo.join(".git")).unwrap();
    fs::write(parent.join(".stackctl.toml"), r#"logLevel = "error""#).unwrap();

    let json = info_json(&tmp, &src);
    assert_eq!(json["config"]["log_level"], "info");
}

#[test]
fn explicit_config_flag_overrides_discovery() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".stackctl.toml"), r#"logLevel = "warn""#).unwrap();
    let explicit = tmp.path().join("other.json");
    fs::write(&explicit, r#"{"logLevel": "error", "options": {"name": "Other"}}"#).unwrap();

    let output = cmd_in(&tmp, tmp.path())
        .args(["--config", explicit.to_str().unwrap(), "info", "--offline", "--json"])
        .assert()
        .success();
    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();

    assert_eq!(json["config"]["log_level"], "error");
    assert_eq!(json["config"]["name"], "Other");
    assert!(
        json["config"]["config_file"]
            .as_str()
            .unwrap()
            .ends_with("other.json")
    );
    assert_eq!(json["config"]["sources"].as_array().unwrap().len(), 2);
}

#[test]
fn config_at_repository_root_found_from_subdirectory() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("repo");
    let sub = repo.join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::create_dir(repo.join(".git")).unwrap();
    fs::write(
        repo.join(".stackctl.json"),
        r#"{"logLevel": "debug", "commands": {"say-hello": "echo hello"}}"#,
    )
    .unwrap();

    let json = info_json(&tmp, &sub);
    assert_eq!(json["config"]["log_level"], "debug");
    assert_eq!(json["config"]["commands"][0], "say-hello");
    assert!(
        json["config"]["config_file"]
            .as_str()
            .unwrap()
            .ends_with(".stackctl.json")
    );
}

#[test]
fn doctor_reports_explicit_config_file() {
    let tmp = TempDir::new().unwrap();
    let explicit = tmp.path().join("launch.json");
    fs::write(&explicit, r#"{"options": {"name": "Explicit"}}"#).unwrap();

    let output = cmd_in(&tmp, tmp.path())
        .args(["--config", explicit.to_str().unwrap(), "doctor", "--no-git", "--json"])
        .assert()
        .success();
    let json: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();

    assert_eq!(json["config"]["found"], true);
    assert!(json["config"]["file"].as_str().unwrap().ends_with("launch.json"));
}

#[test]
fn doctor_text_lists_explicit_config_file() {
    let tmp = TempDir::new().unwrap();
    let explicit = tmp.path().join("launch.json");
    fs::write(&explicit, "{}").unwrap();

    cmd_in(&tmp, tmp.path())
        .args(["--config", explicit.to_str().unwrap(), "doctor", "--no-git"])
        .assert()
        .success()
        .stdout(predicate::str::contains("launch.json"))
        .stdout(predicate::str::contains("No config file found").not());
}

// =============================================================================
// Paths
// =============================================================================

#[test]
fn relative_paths_resolve_against_the_config_file() {
    let tmp = TempDir::new().unwrap();
    let sub_dir = tmp.path().join("services");
    fs::create_dir_all(&sub_dir).unwrap();
    fs::write(
        tmp.path().join(".stackctl.yaml"),
        "dockerComposePath: docker/compose.yml\nmakefilePath: Makefile\n",
    )
    .unwrap();

    let json = info_json(&tmp, &sub_dir);
    let compose = json["config"]["docker_compose_path"].as_str().unwrap();
    let makefile = json["config"]["makefile_path"].as_str().unwrap();
    assert!(Path::new(compose).is_absolute());
    assert!(Path::new(compose).ends_with("docker/compose.yml"));
    assert!(!Path::new(compose).starts_with(&sub_dir));
    assert_eq!(
        Path::new(makefile).parent(),
        Path::new(compose).parent().and_then(Path::parent)
    );
}

#[test]
fn empty_paths_count_as_unset() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".stackctl.json"),
        r#"{"dockerComposePath": "", "makefilePath": ""}"#,
    )
    .unwrap();

    let json = info_json(&tmp, tmp.path());
    assert!(json["config"].get("docker_compose_path").is_none());
    assert!(json["config"].get("makefile_path").is_none());
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn commands_keep_document_order() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".stackctl.yaml"),
        "commands:\n  zeta: echo z\n  alpha:\n    one: echo 1\n  mid: echo m\n",
    )
    .unwrap();

    let json = info_json(&tmp, tmp.path());
    assert_eq!(json["config"]["commands"], serde_json::json!(["zeta", "alpha", "mid"]));
}

#[cfg(unix)]
#[test]
fn run_executes_configured_command_from_toml() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".stackctl.toml"),
        "[commands]\nsay-hello = \"echo hello from toml\"\n",
    )
    .unwrap();

    cmd_in(&tmp, tmp.path())
        .args(["run", "say-hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello from toml"));
}

#[cfg(unix)]
#[test]
fn run_walks_nested_groups_from_json() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".stackctl.json"),
        r#"{"commands": {"db": {"migrate": "echo migrating"}}}"#,
    )
    .unwrap();

    cmd_in(&tmp, tmp.path())
        .args(["run", "db", "migrate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("migrating"));
}

#[test]
fn run_unknown_entry_fails() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".stackctl.json"),
        r#"{"commands": {"db": {"migrate": "echo migrating"}}}"#,
    )
    .unwrap();

    cmd_in(&tmp, tmp.path())
        .args(["run", "db", "rollback"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rollback"));
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn malformed_commands_show_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".stackctl.json"),
        r#"{"commands": {"db": 5432}}"#,
    )
    .unwrap();

    cmd_in(&tmp, tmp.path())
        .args(["info", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn invalid_toml_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".stackctl.toml"), "this is not valid toml [[[").unwrap();

    cmd_in(&tmp, tmp.path())
        .args(["info", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
}

#[test]
fn invalid_json_config_shows_error() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".stackctl.json"), "{not valid json}").unwrap();

    cmd_in(&tmp, tmp.path())
        .args(["info", "--offline"])
        .assert()
        .failure();
}

#[test]
fn unknown_config_field_is_ignored() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".stackctl.toml"),
        "logLevel = \"info\"\nunknownField = \"ignored\"\n",
    )
    .unwrap();

    cmd_in(&tmp, tmp.path())
        .args(["info", "--offline"])
        .assert()
        .success();
}
