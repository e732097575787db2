use predicates::prelude::*;

use crate::common::{TestEnv, WEATHER_ID};

#[test]
fn connection_create_and_list() {
    let env = TestEnv::new();

    env.cmd()
        .args(["connection", "create", "work", "a1b2c3d4", "--set", "API_KEY=sk-live-123456"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created connection 'work'"));

    env.cmd()
        .args(["connection", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "work ({WEATHER_ID}::npm::@weather/mcp)"
        )))
        .stdout(predicate::str::contains("[1 credentials]"));
}

#[test]
fn connection_info_masks_values() {
    let env = TestEnv::new();
    env.create_connection("work", WEATHER_ID, &["API_KEY=sk-live-123456"]);

    env.cmd()
        .args(["connection", "info", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API_KEY = sk-******"))
        .stdout(predicate::str::contains("sk-live-123456").not());

    env.cmd()
        .args(["connection", "info", "work", "--show-values"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API_KEY = sk-live-123456"));
}

#[test]
fn connection_check_reports_missing_required() {
    let env = TestEnv::new();
    env.create_connection("empty", WEATHER_ID, &[]);

    env.cmd()
        .args(["connection", "check", "empty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is missing"))
        .stdout(predicate::str::contains("- API_KEY"));

    env.cmd()
        .args(["connection", "set", "empty", "API_KEY", "sk-abc"])
        .assert()
        .success();

    env.cmd()
        .args(["connection", "check", "empty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("has every required credential"));
}

#[test]
fn connection_unset_and_update() {
    let env = TestEnv::new();
    env.create_connection("work", WEATHER_ID, &["API_KEY=one", "UNITS=imperial"]);

    env.cmd()
        .args(["connection", "unset", "work", "UNITS"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed UNITS"));

    env.cmd()
        .args(["connection", "update", "work", "--name", "home", "--replace", "API_KEY=two"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated connection 'home'"));

    env.cmd()
        .args(["connection", "info", "home", "--show-values"])
        .assert()
        .success()
        .stdout(predicate::str::contains("API_KEY = two"))
        .stdout(predicate::str::contains("UNITS").not());
}

#[test]
fn connection_create_rejects_bad_pair() {
    let env = TestEnv::new();

    env.cmd()
        .args(["connection", "create", "bad", WEATHER_ID, "--set", "NOEQUALS"])
        .assert()
        .failure();
}

#[test]
fn connection_in_use_cannot_be_removed() {
    let env = TestEnv::new();
    env.create_bundle("stack", &[WEATHER_ID]);
    env.create_connection("work", WEATHER_ID, &["API_KEY=sk-live-123456"]);

    env.cmd()
        .args(["bundle", "attach", "stack", "a1b2c3d4", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Attached connection 'work'"));

    env.cmd()
        .args(["connection", "info", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Used by:     stack"));

    env.cmd()
        .args(["connection", "remove", "work"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("still used by bundle(s): stack"));

    env.cmd()
        .args(["bundle", "detach", "stack", WEATHER_ID])
        .assert()
        .success()
        .stdout(predicate::str::contains("Detached connection"));

    env.cmd()
        .args(["connection", "remove", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed connection 'work'"));
}

#[test]
fn credential_store_plain_and_encrypted() {
    let env = TestEnv::new();

    env.cmd()
        .args(["credential", "set", WEATHER_ID, "API_KEY", "sk-plain-value"])
        .assert()
        .success();
    env.cmd()
        .args(["credential", "set", "other", "TOKEN", "secret-token", "--passphrase", "hunter2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(encrypted)"));

    env.cmd()
        .args(["credential", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("other (encrypted)"))
        .stdout(predicate::str::contains(WEATHER_ID));

    env.cmd()
        .args(["credential", "get", "other"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("passphrase is required"));

    env.cmd()
        .args(["credential", "get", "other", "--passphrase", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("wrong passphrase"));

    env.cmd()
        .args(["credential", "get", "other", "--passphrase", "hunter2", "--show-values"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TOKEN = secret-token"));

    env.cmd()
        .args(["credential", "remove", WEATHER_ID])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed all credentials"));
}
