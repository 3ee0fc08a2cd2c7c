//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// A command running in an empty directory with no user config in reach.
fn isolated(tmp: &TempDir) -> Command {
    let mut cmd = cmd();
    cmd.current_dir(tmp.path())
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("Options:"));
}

#[test]
fn help_lists_launcher_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compose"))
        .stdout(predicate::str::contains("make"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn long_help_lists_environment() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("STACKCTL_LOG_DIR"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// =============================================================================
// Info Command
// =============================================================================

#[test]
fn info_shows_package_name_and_version() {
    let tmp = TempDir::new().unwrap();
    isolated(&tmp)
        .args(["info", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_NAME")))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")))
        .stdout(predicate::str::contains("Release").not());
}

#[test]
fn info_json_outputs_valid_json() {
    let tmp = TempDir::new().unwrap();
    let output = isolated(&tmp)
        .args(["info", "--offline", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("info --json should output valid JSON");

    assert_eq!(json["name"], env!("CARGO_PKG_NAME"));
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(json["config"]["commands"], serde_json::json!([]));
    assert!(json.get("release").is_none());
}

// =============================================================================
// Doctor Command
// =============================================================================

#[test]
fn doctor_json_reports_tools() {
    let tmp = TempDir::new().unwrap();
    let output = isolated(&tmp)
        .args(["doctor", "--json", "--no-git"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(json["config"]["found"], false);
    assert_eq!(json["commands"], 0);
    let tools: Vec<&str> = json["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(tools, ["git", "docker", "make", "aws"]);
}

// =============================================================================
// Launcher
// =============================================================================

#[test]
fn launcher_without_config_has_nothing_to_launch() {
    let tmp = TempDir::new().unwrap();
    isolated(&tmp)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to launch"));
}

#[test]
fn launcher_json_leaves_stdout_empty_without_report() {
    let tmp = TempDir::new().unwrap();
    fs_write(&tmp, ".stackctl.json", r#"{"options": {"name": "Platform Stack"}}"#);

    isolated(&tmp)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn make_json_sends_warnings_to_stderr_only() {
    let tmp = TempDir::new().unwrap();
    fs_write(&tmp, ".stackctl.json", r#"{"makefilePath": "nope/Makefile"}"#);

    isolated(&tmp)
        .args(["--json", "make"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Makefile not found"));
}

#[test]
fn compose_without_path_is_skipped() {
    let tmp = TempDir::new().unwrap();
    isolated(&tmp).arg("compose").assert().success();
}

#[test]
fn make_with_missing_makefile_warns() {
    let tmp = TempDir::new().unwrap();
    fs_write(&tmp, ".stackctl.json", r#"{"makefilePath": "nope/Makefile"}"#);

    isolated(&tmp)
        .arg("make")
        .assert()
        .success()
        .stderr(predicate::str::contains("Makefile not found"));
}

// =============================================================================
// Run Command
// =============================================================================

#[cfg(unix)]
#[test]
fn run_raw_executes_shell_command() {
    let tmp = TempDir::new().unwrap();
    isolated(&tmp)
        .args(["run", "--raw", "echo hello from raw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello from raw"));
}

#[cfg(unix)]
#[test]
fn run_raw_failure_exits_nonzero() {
    let tmp = TempDir::new().unwrap();
    isolated(&tmp)
        .args(["run", "--raw", "exit 3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("command failed"));
}

#[test]
fn run_raw_invalid_json_is_rejected() {
    let tmp = TempDir::new().unwrap();
    isolated(&tmp)
        .args(["run", "--raw", "{}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing was run"));
}

#[cfg(unix)]
#[test]
fn run_json_reports_resolution() {
    let tmp = TempDir::new().unwrap();
    let output = isolated(&tmp)
        .args(["run", "--json", "--raw", "true"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["result"], "executed");
    assert_eq!(json["command"], "true");
    assert_eq!(json["succeeded"], true);
}

#[test]
fn run_rejects_path_with_raw() {
    cmd()
        .args(["run", "db", "--raw", "echo hi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_and_verbose_flags_accepted() {
    let tmp = TempDir::new().unwrap();
    isolated(&tmp).args(["-q", "info", "--offline"]).assert().success();
    isolated(&tmp).args(["-vv", "info", "--offline"]).assert().success();
}

#[test]
fn color_choices_accepted() {
    let tmp = TempDir::new().unwrap();
    for choice in ["auto", "always", "never"] {
        isolated(&tmp)
            .args(["--color", choice, "info", "--offline"])
            .assert()
            .success();
    }
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn invalid_flag_shows_error() {
    cmd()
        .arg("--not-a-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn chdir_nonexistent_fails() {
    cmd()
        .args(["-C", "/nonexistent/path/that/does/not/exist", "info", "--offline"])
        .assert()
        .failure();
}

fn fs_write(tmp: &TempDir, name: &str, contents: &str) {
    std::fs::write(tmp.path().join(name), contents).unwrap();
}
