//! Integration tests for the CLI skeleton: help, version, global flags, and
//! the failure paths that need no cloud access.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// The binary with its config file and marker directory inside `home`.
fn dev_machine(home: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("dev-machine"));
    cmd.env("NO_COLOR", "1")
        .env("DEV_MACHINE_HOME", home.path())
        .env("DEV_MACHINE_CONFIG", home.path().join("config"))
        .env_remove("DEV_MACHINE_YES");
    cmd
}

fn home() -> TempDir {
    TempDir::new().expect("temp dir")
}

// --- Help and version tests ---

#[test]
fn test_cli_no_args_shows_help() {
    // arg_required_else_help prints help on stderr and exits 2
    let home = home();
    dev_machine(&home).assert().code(2).stderr(predicate::str::contains(
        "Ephemeral EC2 development machines",
    ));
}

#[test]
fn test_cli_help_lists_every_command() {
    let home = home();
    let mut assert = dev_machine(&home).arg("--help").assert().success();
    for command in [
        "create", "notebook", "list", "remove", "clean", "tunnel", "config", "makefile",
        "version",
    ] {
        assert = assert.stdout(predicate::str::contains(command));
    }
}

#[test]
fn test_cli_version_flag_shows_version() {
    let home = home();
    dev_machine(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_command_human() {
    let home = home();
    dev_machine(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "dev-machine v{}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_version_command_json_is_only_json() {
    let home = home();
    let output = dev_machine(&home)
        .args(["version", "--json"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout is one JSON document");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_unknown_command_fails() {
    let home = home();
    dev_machine(&home)
        .arg("launch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// --- Failure paths that stop before any cloud call ---

#[test]
fn test_create_requires_project() {
    let home = home();
    dev_machine(&home)
        .args(["create", "box"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--project"));
}

#[test]
fn test_create_without_image_id_explains_config() {
    let home = home();
    dev_machine(&home)
        .args(["create", "box", "--project", "dev"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("instance.image_id"));
}

#[test]
fn test_notebook_rejects_equal_ports() {
    let home = home();
    dev_machine(&home)
        .args([
            "notebook",
            "nb",
            "--project",
            "dev",
            "--jupyter-port",
            "9000",
            "--dask-port",
            "9000",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must differ"));
}

#[test]
fn test_notebook_rejects_bad_image() {
    let home = home();
    dev_machine(&home)
        .args(["notebook", "nb", "--project", "dev", "--image", "a:b:c"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid image reference"));
}

#[test]
fn test_tunnel_unknown_machine_fails() {
    let home = home();
    dev_machine(&home)
        .args(["tunnel", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No registered machine named 'ghost'"));
}

#[test]
fn test_tunnel_unknown_machine_json_error() {
    let home = home();
    let output = dev_machine(&home)
        .args(["--json", "tunnel", "ghost"])
        .output()
        .expect("runs");
    assert!(!output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("error is JSON on stdout");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "COMMAND_FAILED");
    assert!(
        value["message"]
            .as_str()
            .is_some_and(|m| m.contains("ghost"))
    );
}

#[test]
fn test_remove_without_terminal_requires_yes() {
    let home = home();
    dev_machine(&home)
        .args(["remove", "i-0abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}
