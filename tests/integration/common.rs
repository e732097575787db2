use std::fs;

use assert_cmd::Command;
use tempfile::TempDir;

pub const WEATHER_ID: &str = "a1b2c3d4-0000-4000-8000-000000000001";
pub const NOTES_ID: &str = "b2c3d4e5-0000-4000-8000-000000000002";
pub const SEARCH_ID: &str = "c3d4e5f6-0000-4000-8000-000000000003";
pub const LEGACY_ID: &str = "abc123";

pub struct TestEnv {
    pub data_dir: TempDir,
    pub project_dir: TempDir,
}

impl TestEnv {
    /// Fresh data directory seeded with [`sample_catalogue`] as `catalogue.json`.
    pub fn new() -> Self {
        let env = Self {
            data_dir: TempDir::new().expect("failed to create data_dir"),
            project_dir: TempDir::new().expect("failed to create project_dir"),
        };
        fs::write(
            env.data_dir.path().join("catalogue.json"),
            serde_json::to_string_pretty(&sample_catalogue()).unwrap(),
        )
        .unwrap();
        env
    }

    /// Build an mcp-bundler Command pre-configured with --data-dir and cwd = project_dir.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("mcp-bundler"));
        cmd.arg("--data-dir")
            .arg(self.data_dir.path())
            .current_dir(self.project_dir.path())
            .env_remove("MCP_BUNDLER_CATALOGUE")
            .env_remove("MCP_BUNDLER_PASSPHRASE");
        cmd
    }

    /// Shorthand: create a bundle holding `servers` (package 0 each).
    pub fn create_bundle(&self, name: &str, servers: &[&str]) {
        let mut cmd = self.cmd();
        cmd.args(["bundle", "create", name]);
        for server in servers {
            cmd.args(["--server", server]);
        }
        cmd.assert().success();
    }

    /// Shorthand: create a connection for package 0 of `server`.
    pub fn create_connection(&self, name: &str, server: &str, credentials: &[&str]) {
        let mut cmd = self.cmd();
        cmd.args(["connection", "create", name, server]);
        for kv in credentials {
            cmd.args(["--set", kv]);
        }
        cmd.assert().success();
    }

    pub fn stdout(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).assert().success().get_output().stdout.clone();
        String::from_utf8(output).unwrap()
    }
}

/// Three hex-id servers (npm with a secret key, pypi, remote) and one entry
/// with a short legacy id.
pub fn sample_catalogue() -> serde_json::Value {
    serde_json::json!([
        {
            "id": WEATHER_ID,
            "name": "Weather Tools",
            "description": "Forecasts and alerts",
            "categories": ["data"],
            "keywords": ["forecast"],
            "packages": [
                {
                    "registry_name": "npm",
                    "package_name": "@weather/mcp",
                    "environment_variables": [
                        { "name": "API_KEY", "is_required": true, "is_secret": true },
                        { "name": "UNITS", "default_value": "metric" }
                    ]
                },
                {
                    "registry_name": "docker",
                    "package_name": "weather/mcp",
                    "environment_variables": [
                        { "name": "API_KEY", "is_required": true, "is_secret": true }
                    ]
                }
            ]
        },
        {
            "id": NOTES_ID,
            "name": "Notes Server",
            "description": "Plain text notes",
            "categories": ["productivity"],
            "packages": [
                { "registry_name": "pypi", "package_name": "notes-mcp" }
            ]
        },
        {
            "id": SEARCH_ID,
            "name": "Hosted Search",
            "categories": ["search"],
            "packages": [
                {
                    "registry_name": "remote",
                    "package_name": "hosted-search",
                    "environment_variables": [
                        { "name": "SEARCH_TOKEN", "is_required": true, "is_secret": true }
                    ],
                    "package_arguments": [
                        { "type": "url", "name": "endpoint", "value": "https://search.example.com/mcp" }
                    ]
                }
            ]
        },
        {
            "id": LEGACY_ID,
            "name": "Legacy Clock",
            "packages": [
                { "registry_name": "npm", "package_name": "legacy-clock" }
            ]
        }
    ])
}
