use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use predicates::prelude::*;

use crate::common::{LEGACY_ID, NOTES_ID, TestEnv, WEATHER_ID};

fn share_token(env: &TestEnv, bundle: &str) -> String {
    let stdout = env.stdout(&["share", bundle]);
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("Token: "))
        .expect("share output has a token line")
        .trim()
        .to_string()
}

#[test]
fn share_prints_token_and_preview_link() {
    let env = TestEnv::new();
    env.create_bundle("shared", &[WEATHER_ID]);

    let token = share_token(&env, "shared");
    assert!(!token.is_empty());
    assert!(!token.contains('='));

    env.cmd()
        .args(["share", "shared"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Link:  http://localhost:8080/preview.html#/{token}"
        )));
}

#[test]
fn share_link_uses_configured_origin() {
    let env = TestEnv::new();
    env.create_bundle("shared", &[NOTES_ID]);

    env.cmd()
        .args(["config", "set", "share_origin", "https://bundles.example.org"])
        .assert()
        .success();
    env.cmd()
        .args(["config", "set", "share_base_path", "/app/"])
        .assert()
        .success();

    env.cmd()
        .args(["share", "shared"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Link:  https://bundles.example.org/app/preview.html#/",
        ));
}

#[test]
fn share_then_import_round_trip() {
    let env = TestEnv::new();
    env.create_bundle("round-trip", &[WEATHER_ID, NOTES_ID]);
    let token = share_token(&env, "round-trip");

    env.cmd()
        .args(["import", &token, "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Bundle:      round-trip"))
        .stdout(predicate::str::contains(format!("+ Weather Tools ({WEATHER_ID})")))
        .stdout(predicate::str::contains(format!("+ Notes Server ({NOTES_ID})")))
        .stdout(predicate::str::contains("Dry run"));

    // dry run leaves only the original
    env.cmd()
        .args(["bundle", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("round-trip").count(1));

    let link = format!("http://localhost:8080/preview.html#/{token}");
    env.cmd()
        .args(["import", &link])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported bundle 'round-trip'"))
        .stdout(predicate::str::contains("with 2 servers"));

    env.cmd()
        .args(["bundle", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("round-trip (2 servers)").count(2));
}

#[test]
fn share_rejects_non_hex_server_id() {
    let env = TestEnv::new();
    env.create_bundle("legacy", &[LEGACY_ID]);

    env.cmd()
        .args(["share", "legacy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("hexadecimal"));
}

#[test]
fn import_legacy_json_token() {
    let env = TestEnv::new();
    let token = STANDARD.encode(r#"{"name":"Old Bundle","servers":["abc123"]}"#);

    env.cmd()
        .args(["import", &token])
        .assert()
        .success()
        .stdout(predicate::str::contains("+ Legacy Clock (abc123)"))
        .stdout(predicate::str::contains("Imported bundle 'Old Bundle'"))
        .stdout(predicate::str::contains("with 1 servers"));

    env.cmd()
        .args(["bundle", "info", "Old Bundle"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Legacy Clock [npm legacy-clock]"));
}

#[test]
fn import_legacy_bundle_link() {
    let env = TestEnv::new();
    let token = STANDARD.encode(r#"{"name":"Linked","servers":["abc123","missing-server"]}"#);
    let link = format!("https://old.example.org/index.html#/bundle/{token}");

    env.cmd()
        .args(["import", &link, "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+ Legacy Clock (abc123)"))
        .stdout(predicate::str::contains("? missing-server (not in catalogue)"));
}

#[test]
fn import_with_no_known_servers_fails() {
    let env = TestEnv::new();
    let token = STANDARD.encode(r#"{"name":"Ghosts","servers":["nothing-here"]}"#);

    env.cmd()
        .args(["import", &token])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no valid servers found"));

    env.cmd()
        .args(["bundle", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No bundles"));
}

#[test]
fn import_garbage_token_fails() {
    let env = TestEnv::new();

    env.cmd()
        .args(["import", "!!not-a-token!!"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid share token"));
}
