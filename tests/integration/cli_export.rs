use std::fs;

use predicates::prelude::*;
use serde_json::Value;

use crate::common::{NOTES_ID, SEARCH_ID, TestEnv, WEATHER_ID};

fn export_json(env: &TestEnv, args: &[&str]) -> Value {
    serde_json::from_str(&env.stdout(args)).expect("export prints JSON")
}

#[test]
fn export_launcher_uses_placeholders_without_connection() {
    let env = TestEnv::new();
    env.create_bundle("stack", &[WEATHER_ID, NOTES_ID, SEARCH_ID]);

    let doc = export_json(&env, &["export", "stack"]);
    let servers = &doc["mcpServers"];

    assert_eq!(servers["weather-tools"]["command"], "npx");
    assert_eq!(servers["weather-tools"]["args"][0], "@weather/mcp");
    assert_eq!(servers["weather-tools"]["env"]["API_KEY"], "${API_KEY}");
    assert_eq!(servers["notes-server"]["command"], "uvx");
    assert_eq!(servers["hosted-search"]["url"], "https://search.example.com/mcp");
}

#[test]
fn export_launcher_fills_attached_connection() {
    let env = TestEnv::new();
    env.create_bundle("stack", &[WEATHER_ID]);
    env.create_connection("work", WEATHER_ID, &["API_KEY=sk-live-123456"]);
    env.cmd()
        .args(["bundle", "attach", "stack", WEATHER_ID, "work"])
        .assert()
        .success();

    let doc = export_json(&env, &["export", "stack"]);
    assert_eq!(doc["mcpServers"]["weather-tools"]["env"]["API_KEY"], "sk-live-123456");
}

#[test]
fn export_container_package_passes_env_flags() {
    let env = TestEnv::new();
    env.create_bundle("stack", &[WEATHER_ID]);
    env.cmd()
        .args(["bundle", "set-package", "stack", WEATHER_ID, "1"])
        .assert()
        .success();

    let doc = export_json(&env, &["export", "stack"]);
    let server = &doc["mcpServers"]["weather-tools"];
    assert_eq!(server["command"], "docker");
    assert_eq!(
        server["args"],
        serde_json::json!(["run", "-i", "--rm", "-e", "API_KEY", "weather/mcp"])
    );
}

#[test]
fn export_bundle_document_to_file() {
    let env = TestEnv::new();
    env.create_bundle("stack", &[WEATHER_ID]);
    let out = env.project_dir.path().join("stack.json");

    env.cmd()
        .args(["export", "stack", "--format", "bundle", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported bundle 'stack'"));

    let doc: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(doc["schema"], "urn:mcp-bundler:bundle:v1");
    assert_eq!(doc["bundle"]["name"], "stack");
    assert_eq!(doc["bundle"]["hasCredentials"], false);
    assert_eq!(doc["bundle"]["servers"][0]["serverId"], WEATHER_ID);
}

#[test]
fn export_format_setting_is_the_default() {
    let env = TestEnv::new();
    env.create_bundle("stack", &[NOTES_ID]);
    env.cmd()
        .args(["config", "set", "export_format", "bundle"])
        .assert()
        .success();

    let doc = export_json(&env, &["export", "stack"]);
    assert_eq!(doc["schema"], "urn:mcp-bundler:bundle:v1");
}

#[test]
fn export_rejects_unknown_format() {
    let env = TestEnv::new();
    env.create_bundle("stack", &[]);

    env.cmd()
        .args(["export", "stack", "--format", "yaml"])
        .assert()
        .failure();
}

#[test]
fn install_writes_mcp_json() {
    let env = TestEnv::new();
    env.create_bundle("stack", &[WEATHER_ID, NOTES_ID]);

    env.cmd()
        .args(["install", "stack"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 'weather-tools'"))
        .stdout(predicate::str::contains("Added 'notes-server'"));

    let mcp_json = env.project_dir.path().join(".mcp.json");
    let doc: Value = serde_json::from_str(&fs::read_to_string(&mcp_json).unwrap()).unwrap();
    assert_eq!(doc["mcpServers"]["notes-server"]["command"], "uvx");
}

#[test]
fn install_preserves_existing_entries_and_skips_without_force() {
    let env = TestEnv::new();
    env.create_bundle("stack", &[NOTES_ID]);
    let mcp_json = env.project_dir.path().join(".mcp.json");
    fs::write(
        &mcp_json,
        r#"{"mcpServers":{"notes-server":{"command":"custom"},"other":{"command":"keep"}}}"#,
    )
    .unwrap();

    env.cmd()
        .args(["install", "stack"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already configured"));
    let doc: Value = serde_json::from_str(&fs::read_to_string(&mcp_json).unwrap()).unwrap();
    assert_eq!(doc["mcpServers"]["notes-server"]["command"], "custom");

    env.cmd()
        .args(["install", "stack", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Replaced 'notes-server'"));
    let doc: Value = serde_json::from_str(&fs::read_to_string(&mcp_json).unwrap()).unwrap();
    assert_eq!(doc["mcpServers"]["notes-server"]["command"], "uvx");
    assert_eq!(doc["mcpServers"]["other"]["command"], "keep");
}

#[test]
fn export_remote_fills_header_from_connection() {
    let env = TestEnv::new();
    env.create_bundle("stack", &[SEARCH_ID]);
    env.create_connection("hosted", SEARCH_ID, &["SEARCH_TOKEN=tok-live"]);
    env.cmd()
        .args(["bundle", "attach", "stack", SEARCH_ID, "hosted"])
        .assert()
        .success();

    let doc = export_json(&env, &["export", "stack"]);
    let server = &doc["mcpServers"]["hosted-search"];
    assert_eq!(server["url"], "https://search.example.com/mcp");
    assert_eq!(server["headers"]["Authorization"], "Bearer tok-live");
}
