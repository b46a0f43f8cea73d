#![allow(deprecated)] // Command::cargo_bin is deprecated in newer assert_cmd releases

mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("siteflow").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("S3 and CloudFront"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("siteflow").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("siteflow"));
}

#[test]
fn test_deploy_help() {
    let mut cmd = Command::cargo_bin("siteflow").unwrap();
    cmd.arg("deploy")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[INSTANCE]"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn test_remove_help() {
    let mut cmd = Command::cargo_bin("siteflow").unwrap();
    cmd.arg("remove")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[INSTANCE]"))
        .stdout(predicate::str::contains("--yes"));
}

#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("siteflow").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

#[test]
fn test_instance_positional_and_flag_conflict() {
    let mut cmd = Command::cargo_bin("siteflow").unwrap();
    cmd.arg("deploy")
        .arg("prod")
        .arg("-i")
        .arg("dev")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_deploy_without_site_file() {
    let project = TestProject::new();
    project
        .cmd()
        .arg("deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No site file found"));
}

#[test]
fn test_deploy_with_missing_config_path() {
    let project = TestProject::new();
    project
        .cmd()
        .arg("deploy")
        .arg("--config")
        .arg("missing.yml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Site file not found"));
}

#[test]
fn test_deploy_rejects_unknown_fields() {
    let project = TestProject::new();
    project.write_site_yml("src: public\nbuckt_name: typo\n");
    project
        .cmd()
        .args(["deploy", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("buckt_name"));
}
