use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Launcher-ready configuration for one server, in the shape MCP hosts read
/// from their `mcpServers` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LauncherConfig {
    Remote {
        #[serde(rename = "type")]
        transport: String,
        url: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        headers: BTreeMap<String, String>,
    },
    Command {
        command: String,
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
    },
}

impl LauncherConfig {
    pub fn env(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Command { env, .. } => Some(env),
            Self::Remote { .. } => None,
        }
    }
}
