use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One bundled server: which catalogue entry, which of its packages, and the
/// connection supplying its credentials (if any).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BundleServerEntry {
    pub server_id: String,
    #[serde(default)]
    pub package_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
}

impl BundleServerEntry {
    pub fn new(server_id: impl Into<String>, package_index: usize) -> Self {
        Self {
            server_id: server_id.into(),
            package_index,
            connection_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", from = "StoredBundle")]
pub struct Bundle {
    pub id: String,
    pub name: String,
    pub description: String,
    pub servers: Vec<BundleServerEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Bundle {
    pub fn entry(&self, server_id: &str) -> Option<&BundleServerEntry> {
        self.servers.iter().find(|e| e.server_id == server_id)
    }

    pub fn entry_mut(&mut self, server_id: &str) -> Option<&mut BundleServerEntry> {
        self.servers.iter_mut().find(|e| e.server_id == server_id)
    }

    pub fn references_connection(&self, connection_id: &str) -> bool {
        self.servers
            .iter()
            .any(|e| e.connection_id.as_deref() == Some(connection_id))
    }
}

/// Partial update applied by `BundleStore::update`.
#[derive(Debug, Clone, Default)]
pub struct BundleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// A server entry as it may appear on disk or in a legacy share payload:
/// either a bare server id or the structured form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredServerEntry {
    Id(String),
    Entry(BundleServerEntry),
}

impl StoredServerEntry {
    pub fn normalize(self) -> BundleServerEntry {
        match self {
            Self::Id(server_id) => BundleServerEntry::new(server_id, 0),
            Self::Entry(entry) => entry,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredBundle {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    servers: Vec<StoredServerEntry>,
    #[serde(default)]
    server_connections: BTreeMap<String, String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default = "Utc::now")]
    created: DateTime<Utc>,
    #[serde(default)]
    updated: Option<DateTime<Utc>>,
}

impl From<StoredBundle> for Bundle {
    fn from(stored: StoredBundle) -> Self {
        let mut server_connections = stored.server_connections;
        let mut servers: Vec<BundleServerEntry> = Vec::with_capacity(stored.servers.len());
        for raw in stored.servers {
            let mut entry = raw.normalize();
            if servers.iter().any(|e| e.server_id == entry.server_id) {
                continue;
            }
            if let Some(connection_id) = server_connections.remove(&entry.server_id) {
                entry.connection_id.get_or_insert(connection_id);
            }
            servers.push(entry);
        }

        Self {
            id: stored.id,
            name: stored.name,
            description: stored.description.unwrap_or_default(),
            servers,
            tags: stored.tags,
            created: stored.created,
            updated: stored.updated.unwrap_or(stored.created),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleIndex {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bundles: Vec<Bundle>,
}

impl Default for BundleIndex {
    fn default() -> Self {
        Self {
            version: default_version(),
            updated: None,
            bundles: Vec::new(),
        }
    }
}

fn default_version() -> u32 {
    1
}
