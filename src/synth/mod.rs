//! Launcher configuration synthesis.
//!
//! Turns a catalogue package plus an optional credential map into the
//! configuration object an MCP host launches. Everything here is a pure
//! function of its inputs.

pub mod env;
pub mod remote;
pub mod secret;

use std::collections::BTreeMap;

use crate::model::{ArgumentKind, LauncherConfig, Package, RegistryKind};

use env::build_env;
pub use secret::is_secret;

/// Arguments that belong to a `docker run` bootstrap. They are dropped when
/// replaying positional arguments for non-container packages.
const DOCKER_BOOTSTRAP_TOKENS: &[&str] = &["run", "-i", "--rm", "-e"];

/// Synthesizes the launcher config for `package`. `credentials` of `None`
/// means no connection is attached and placeholders are emitted instead.
pub fn synthesize(package: &Package, credentials: Option<&BTreeMap<String, String>>) -> LauncherConfig {
    match package.registry() {
        RegistryKind::Remote => remote::synthesize_remote(package, credentials),
        RegistryKind::Docker => LauncherConfig::Command {
            command: "docker".to_string(),
            args: container_args(package),
            env: build_env(package, credentials),
        },
        registry => LauncherConfig::Command {
            command: package
                .runtime_hint
                .clone()
                .filter(|hint| !hint.trim().is_empty())
                .unwrap_or_else(|| registry.default_command().to_string()),
            args: command_args(package),
            env: build_env(package, credentials),
        },
    }
}

/// JSON form of [`synthesize`]; a missing package yields an empty object.
pub fn synthesize_value(
    package: Option<&Package>,
    credentials: Option<&BTreeMap<String, String>>,
) -> serde_json::Value {
    match package {
        Some(package) => serde_json::to_value(synthesize(package, credentials))
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default())),
        None => serde_json::Value::Object(Default::default()),
    }
}

fn container_args(package: &Package) -> Vec<String> {
    let stored: Vec<String> = package
        .package_arguments
        .iter()
        .filter(|a| a.kind == ArgumentKind::Positional)
        .filter_map(|a| a.effective_value())
        .map(str::to_string)
        .collect();
    if !stored.is_empty() {
        return stored;
    }

    let mut args: Vec<String> = ["run", "-i", "--rm"].iter().map(|s| s.to_string()).collect();
    for var in package
        .environment_variables
        .iter()
        .filter(|v| v.is_required || is_secret(v))
    {
        args.push("-e".to_string());
        args.push(var.name.clone());
    }
    args.push(package.package_name.clone());
    args
}

fn command_args(package: &Package) -> Vec<String> {
    let mut args = Vec::new();
    for arg in &package.package_arguments {
        match arg.kind {
            ArgumentKind::Named => {
                let Some(flag) = arg.name.as_deref().filter(|n| !n.is_empty()) else {
                    continue;
                };
                if flag == "type" {
                    continue;
                }
                args.push(flag.to_string());
                if let Some(value) = arg.effective_value() {
                    args.push(value.to_string());
                }
            }
            ArgumentKind::Positional => {
                if let Some(value) = arg.effective_value() {
                    if !DOCKER_BOOTSTRAP_TOKENS.contains(&value) {
                        args.push(value.to_string());
                    }
                }
            }
            ArgumentKind::Url | ArgumentKind::Header => {}
        }
    }

    if !args.iter().any(|a| a == &package.package_name) {
        args.push(package.package_name.clone());
    }
    args
}
