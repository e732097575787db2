use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, reusable credential set scoped to one server + package pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub name: String,
    pub server_id: String,
    pub package_id: String,
    #[serde(default)]
    pub credentials: BTreeMap<String, String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Connection {
    /// Credential value for `name`, ignoring blank entries.
    pub fn credential(&self, name: &str) -> Option<&str> {
        self.credentials
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Partial update applied by `ConnectionRegistry::update`; `None` fields are
/// left untouched.
#[derive(Debug, Clone, Default)]
pub struct ConnectionUpdate {
    pub name: Option<String>,
    pub server_id: Option<String>,
    pub package_id: Option<String>,
    pub credentials: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionIndex {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Default for ConnectionIndex {
    fn default() -> Self {
        Self {
            version: default_version(),
            updated: None,
            connections: Vec::new(),
        }
    }
}

fn default_version() -> u32 {
    1
}
