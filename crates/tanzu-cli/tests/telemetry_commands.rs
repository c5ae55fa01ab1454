//! Integration tests for `tanzu telemetry` and the metrics pipeline.
#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use common::TanzuHome;
use predicates::prelude::*;

#[test]
fn status_on_fresh_home_reports_no_metrics() {
    let home = TanzuHome::new();

    home.cmd()
        .args(["telemetry", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CEIP participation: not set"))
        .stdout(predicate::str::contains("Stored metrics: 0"));
}

#[test]
fn previous_commands_are_counted() {
    let home = TanzuHome::new();

    home.cmd().args(["plugin", "list"]).assert().success();

    home.cmd()
        .args(["telemetry", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored metrics: 1"));

    let rows = home.recorded_commands();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, "plugin list");
    assert_eq!(rows[1].0, "telemetry status");
}

#[test]
fn cli_id_is_generated_and_persisted() {
    let home = TanzuHome::new();

    home.cmd().args(["plugin", "list"]).assert().success();

    let config = std::fs::read_to_string(home.config_dir().join("config.toml")).unwrap();
    assert!(config.contains("cli_id"));
    assert!(config.contains("cli_metrics.db"));

    home.cmd()
        .args(["telemetry", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CLI id: -").not());
}

#[test]
fn clear_removes_stored_metrics() {
    let home = TanzuHome::new();

    home.cmd().args(["plugin", "list"]).assert().success();
    home.cmd().args(["plugin", "list"]).assert().success();

    home.cmd()
        .args(["telemetry", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stored metrics cleared."));

    // Only the clear command itself is recorded after the wipe.
    let rows = home.recorded_commands();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].0, "telemetry clear");
}

#[test]
fn status_with_corrupt_config_shows_defaults() {
    let home = TanzuHome::new();
    home.write_config("cli_id = ");

    home.cmd()
        .args(["telemetry", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CEIP participation: not set"))
        .stdout(predicate::str::contains("Stored metrics: 0"));
}

#[test]
fn send_without_opt_in_is_a_no_op() {
    let home = TanzuHome::new();

    home.cmd().args(["telemetry", "send"]).assert().success();
}

#[test]
fn verbose_and_quiet_conflict() {
    let home = TanzuHome::new();

    home.cmd()
        .args(["-v", "-q", "plugin", "list"])
        .assert()
        .failure();
}
