use std::path::{Path, PathBuf};

use serde_json::{Value, json};

use crate::error::BundlerError;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub path: PathBuf,
    pub added: Vec<String>,
    pub replaced: Vec<String>,
    pub skipped: Vec<String>,
}

/// Merges the `mcpServers` of a launcher document into `dir/.mcp.json`.
/// Existing entries are kept unless `force` is set.
pub fn install_servers(dir: &Path, launcher: &Value, force: bool) -> Result<InstallReport, BundlerError> {
    let mcp_path = dir.join(".mcp.json");
    let invalid = |reason: &str| BundlerError::InvalidMcpConfig {
        path: mcp_path.clone(),
        reason: reason.to_string(),
    };

    let mut root: Value = if mcp_path.exists() {
        let content = std::fs::read_to_string(&mcp_path).map_err(|source| BundlerError::FileRead {
            path: mcp_path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| BundlerError::JsonParse {
            path: mcp_path.clone(),
            source,
        })?
    } else {
        json!({ "mcpServers": {} })
    };

    let servers = root
        .as_object_mut()
        .ok_or_else(|| invalid("expected an object"))?
        .entry("mcpServers")
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .ok_or_else(|| invalid("mcpServers is not an object"))?;

    let mut report = InstallReport {
        path: mcp_path.clone(),
        ..InstallReport::default()
    };
    let incoming = launcher
        .get("mcpServers")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("launcher document has no mcpServers"))?;

    for (name, config) in incoming {
        match (servers.contains_key(name), force) {
            (true, false) => {
                report.skipped.push(name.clone());
                continue;
            }
            (true, true) => report.replaced.push(name.clone()),
            (false, _) => report.added.push(name.clone()),
        }
        servers.insert(name.clone(), config.clone());
    }

    let content = serde_json::to_string_pretty(&root)?;
    std::fs::create_dir_all(dir).map_err(|source| BundlerError::DirCreate {
        path: dir.to_path_buf(),
        source,
    })?;
    std::fs::write(&mcp_path, content + "\n").map_err(|source| BundlerError::FileWrite {
        path: mcp_path.clone(),
        source,
    })?;
    tracing::info!(path = %mcp_path.display(), added = report.added.len(), "updated .mcp.json");
    Ok(report)
}
