use predicates::prelude::*;

use crate::common::{NOTES_ID, TestEnv, WEATHER_ID};

#[test]
fn bundle_create_and_list() {
    let env = TestEnv::new();

    env.cmd()
        .args(["bundle", "create", "dev-stack", "-d", "Daily tools", "-t", "work"])
        .args(["--server", "a1b2c3d4", "--server", NOTES_ID])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created bundle 'dev-stack'"));

    env.cmd()
        .args(["bundle", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dev-stack (2 servers)"))
        .stdout(predicate::str::contains("Daily tools"))
        .stdout(predicate::str::contains("[work]"));
}

#[test]
fn bundle_list_empty() {
    let env = TestEnv::new();

    env.cmd()
        .args(["bundle", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No bundles"));
}

#[test]
fn bundle_list_with_tag_filter() {
    let env = TestEnv::new();

    env.cmd()
        .args(["bundle", "create", "tagged", "--tag", "rust"])
        .assert()
        .success();
    env.create_bundle("untagged", &[]);

    env.cmd()
        .args(["bundle", "list", "--tag", "rust"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tagged"))
        .stdout(predicate::str::contains("untagged").not());
}

#[test]
fn bundle_create_unknown_server_fails() {
    let env = TestEnv::new();

    env.cmd()
        .args(["bundle", "create", "broken", "--server", "ffffffff"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found in catalogue"));

    env.cmd()
        .args(["bundle", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No bundles"));
}

#[test]
fn bundle_info_shows_servers_and_packages() {
    let env = TestEnv::new();
    env.create_bundle("info-test", &[WEATHER_ID]);

    env.cmd()
        .args(["bundle", "info", "info-test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Name:        info-test"))
        .stdout(predicate::str::contains("Weather Tools [npm @weather/mcp]"));
}

#[test]
fn bundle_info_not_found() {
    let env = TestEnv::new();

    env.cmd()
        .args(["bundle", "info", "nonexistent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn bundle_add_server_is_idempotent() {
    let env = TestEnv::new();
    env.create_bundle("stack", &[]);

    env.cmd()
        .args(["bundle", "add-server", "stack", "b2c3d4e5"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Added '{NOTES_ID}'")));

    env.cmd()
        .args(["bundle", "add-server", "stack", NOTES_ID])
        .assert()
        .success()
        .stdout(predicate::str::contains("already in bundle"));

    env.cmd()
        .args(["bundle", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stack (1 servers)"));
}

#[test]
fn bundle_add_server_rejects_missing_package() {
    let env = TestEnv::new();
    env.create_bundle("stack", &[]);

    env.cmd()
        .args(["bundle", "add-server", "stack", NOTES_ID, "--package", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no package at index 3"));
}

#[test]
fn bundle_remove_server_by_prefix() {
    let env = TestEnv::new();
    env.create_bundle("stack", &[WEATHER_ID, NOTES_ID]);

    env.cmd()
        .args(["bundle", "remove-server", "stack", "a1b2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Removed '{WEATHER_ID}'")));

    env.cmd()
        .args(["bundle", "info", "stack"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Weather Tools").not())
        .stdout(predicate::str::contains("Notes Server"));
}

#[test]
fn bundle_set_package_switches_to_container() {
    let env = TestEnv::new();
    env.create_bundle("stack", &[WEATHER_ID]);

    env.cmd()
        .args(["bundle", "set-package", "stack", WEATHER_ID, "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("now uses docker weather/mcp"));

    env.cmd()
        .args(["bundle", "info", "stack"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[docker weather/mcp]"));
}

#[test]
fn bundle_update_renames_and_retags() {
    let env = TestEnv::new();
    env.create_bundle("old-name", &[]);

    env.cmd()
        .args(["bundle", "update", "old-name", "--name", "new-name", "-t", "fresh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated bundle 'new-name'"));

    env.cmd()
        .args(["bundle", "list", "--tag", "fresh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("new-name"))
        .stdout(predicate::str::contains("old-name").not());
}

#[test]
fn bundle_remove_with_force() {
    let env = TestEnv::new();
    env.create_bundle("doomed", &[NOTES_ID]);

    env.cmd()
        .args(["bundle", "remove", "doomed", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed bundle 'doomed'"));

    env.cmd()
        .args(["bundle", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No bundles"));
}

#[test]
fn bundle_remove_declined_keeps_bundle() {
    let env = TestEnv::new();
    env.create_bundle("kept", &[]);

    env.cmd()
        .args(["bundle", "remove", "kept"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted"));

    env.cmd()
        .args(["bundle", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kept"));
}

#[test]
fn search_matches_keywords_and_categories() {
    let env = TestEnv::new();

    env.cmd()
        .args(["search", "forecast"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Weather Tools"))
        .stdout(predicate::str::contains("Notes Server").not());

    env.cmd()
        .args(["search", "--category", "productivity"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Notes Server"))
        .stdout(predicate::str::contains("Weather Tools").not());
}

#[test]
fn search_falls_back_to_cache_when_catalogue_is_gone() {
    let env = TestEnv::new();

    env.cmd().args(["search", "notes"]).assert().success();
    std::fs::remove_file(env.data_dir.path().join("catalogue.json")).unwrap();

    env.cmd()
        .args(["search", "notes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Notes Server"))
        .stderr(predicate::str::contains("cached results"));
}

#[test]
fn info_lists_packages_and_variables() {
    let env = TestEnv::new();

    env.cmd()
        .args(["info", "a1b2c3d4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Weather Tools"))
        .stdout(predicate::str::contains("@weather/mcp"))
        .stdout(predicate::str::contains("API_KEY"));
}
