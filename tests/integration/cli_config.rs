use predicates::prelude::*;

use crate::common::TestEnv;

#[test]
fn config_show_defaults() {
    let env = TestEnv::new();

    env.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Data directory"))
        .stdout(predicate::str::contains("catalogue.json"))
        .stdout(predicate::str::contains("export_format:"))
        .stdout(predicate::str::contains("launcher"))
        .stdout(predicate::str::contains("http://localhost:8080"));
}

#[test]
fn config_set_and_get() {
    let env = TestEnv::new();

    env.cmd()
        .args(["config", "set", "theme", "dark"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set theme = dark"));

    env.cmd()
        .args(["config", "get", "theme"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dark"));
}

#[test]
fn config_set_normalizes_base_path() {
    let env = TestEnv::new();

    env.cmd()
        .args(["config", "set", "share_base_path", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set share_base_path = /app/"));
}

#[test]
fn config_set_invalid_value_fails() {
    let env = TestEnv::new();

    env.cmd()
        .args(["config", "set", "offline_mode", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected true or false"));
}

#[test]
fn config_set_unknown_key_lists_valid_keys() {
    let env = TestEnv::new();

    env.cmd()
        .args(["config", "set", "nonexistent", "value"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown config key"))
        .stderr(predicate::str::contains("share_origin"));
}

#[test]
fn config_catalogue_path_points_search_elsewhere() {
    let env = TestEnv::new();
    let other = env.project_dir.path().join("other-catalogue.json");
    std::fs::write(
        &other,
        r#"[{"id":"deadbeef-1","name":"Elsewhere","packages":[{"registry_name":"npm","package_name":"elsewhere"}]}]"#,
    )
    .unwrap();

    env.cmd()
        .args(["config", "set", "catalogue_path"])
        .arg(&other)
        .assert()
        .success();

    env.cmd()
        .args(["search"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Elsewhere"))
        .stdout(predicate::str::contains("Weather Tools").not());
}

#[test]
fn offline_mode_serves_cached_search() {
    let env = TestEnv::new();

    env.cmd().args(["search", "weather"]).assert().success();
    env.cmd()
        .args(["config", "set", "offline_mode", "true"])
        .assert()
        .success();

    env.cmd()
        .args(["search", "weather"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Weather Tools"))
        .stderr(predicate::str::contains("cached results"));
}
