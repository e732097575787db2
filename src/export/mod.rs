pub mod install;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::model::{Bundle, BundleServerEntry, CatalogueEntry};
use crate::store::{CatalogueStore, ConnectionRegistry, Workspace};
use crate::synth;

/// Written into every bundle document; readers must check it before use.
pub const BUNDLE_SCHEMA: &str = "urn:mcp-bundler:bundle:v1";
const BUNDLE_DOCUMENT_VERSION: &str = "1.0.0";

/// Supplies the credential values used when synthesizing a server's config.
pub trait CredentialSource {
    fn credentials_for(&self, entry: &BundleServerEntry) -> Option<BTreeMap<String, String>>;
}

impl CredentialSource for ConnectionRegistry {
    fn credentials_for(&self, entry: &BundleServerEntry) -> Option<BTreeMap<String, String>> {
        let id = entry.connection_id.as_deref()?;
        self.get(id).map(|c| c.credentials.clone())
    }
}

/// The attached connection wins; otherwise plain-text credentials stored for
/// the server in simple mode are used.
impl CredentialSource for Workspace {
    fn credentials_for(&self, entry: &BundleServerEntry) -> Option<BTreeMap<String, String>> {
        if let Some(values) = self.connections.credentials_for(entry) {
            return Some(values);
        }
        self.credentials
            .get(&entry.server_id, None)
            .ok()
            .filter(|values| !values.is_empty())
    }
}

/// Lowercase, runs of non-alphanumerics collapsed to one hyphen, no leading
/// or trailing hyphen.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    out
}

/// Synthesized launcher config for one bundled server, `{}` when the server
/// or the selected package is missing from the catalogue.
pub fn server_config(
    entry: &BundleServerEntry,
    catalogue: &CatalogueStore,
    credentials: &impl CredentialSource,
) -> Value {
    let package = catalogue
        .get(&entry.server_id)
        .and_then(|server| server.package(entry.package_index));
    if package.is_none() {
        tracing::warn!(server = %entry.server_id, package_index = entry.package_index, "no package to export");
    }
    let values = credentials.credentials_for(entry);
    synth::synthesize_value(package, values.as_ref())
}

fn display_name<'a>(entry: &'a BundleServerEntry, server: Option<&'a CatalogueEntry>) -> &'a str {
    server.map_or(entry.server_id.as_str(), |s| s.name.as_str())
}

/// `{ "mcpServers": { <slug>: <config> } }`
pub fn launcher_document(
    bundle: &Bundle,
    catalogue: &CatalogueStore,
    credentials: &impl CredentialSource,
) -> Value {
    let mut servers = Map::new();
    for entry in &bundle.servers {
        let base = slug(display_name(entry, catalogue.get(&entry.server_id)));
        let base = if base.is_empty() { slug(&entry.server_id) } else { base };
        let mut key = base.clone();
        let mut suffix = 2;
        while servers.contains_key(&key) {
            key = format!("{base}-{suffix}");
            suffix += 1;
        }
        servers.insert(key, server_config(entry, catalogue, credentials));
    }
    json!({ "mcpServers": servers })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialInfo {
    pub name: String,
    pub required: bool,
    pub has_value: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedServer {
    pub server_id: String,
    pub name: String,
    pub package_index: usize,
    pub config: Value,
    pub credentials: Vec<CredentialInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedBundle {
    pub id: String,
    pub name: String,
    pub description: String,
    pub version: &'static str,
    pub servers: Vec<ExportedServer>,
    pub exported: DateTime<Utc>,
    pub has_credentials: bool,
}

#[derive(Debug, Serialize)]
pub struct BundleDocument {
    pub schema: &'static str,
    pub bundle: ExportedBundle,
}

/// Self-describing bundle export. Credential values only ever appear inside
/// the synthesized configs; the metadata lists names and presence.
pub fn bundle_document(
    bundle: &Bundle,
    catalogue: &CatalogueStore,
    credentials: &impl CredentialSource,
    now: DateTime<Utc>,
) -> BundleDocument {
    let servers: Vec<ExportedServer> = bundle
        .servers
        .iter()
        .map(|entry| {
            let server = catalogue.get(&entry.server_id);
            let values = credentials.credentials_for(entry).unwrap_or_default();
            let info = server
                .and_then(|s| s.package(entry.package_index))
                .map(|package| {
                    package
                        .environment_variables
                        .iter()
                        .map(|var| CredentialInfo {
                            name: var.name.clone(),
                            required: var.is_required,
                            has_value: values.get(&var.name).is_some_and(|v| !v.trim().is_empty()),
                        })
                        .collect()
                })
                .unwrap_or_default();
            ExportedServer {
                server_id: entry.server_id.clone(),
                name: display_name(entry, server).to_string(),
                package_index: entry.package_index,
                config: server_config(entry, catalogue, credentials),
                credentials: info,
            }
        })
        .collect();

    let has_credentials = servers
        .iter()
        .any(|s| s.credentials.iter().any(|c| c.has_value));

    BundleDocument {
        schema: BUNDLE_SCHEMA,
        bundle: ExportedBundle {
            id: bundle.id.clone(),
            name: bundle.name.clone(),
            description: bundle.description.clone(),
            version: BUNDLE_DOCUMENT_VERSION,
            servers,
            exported: now,
            has_credentials,
        },
    }
}
