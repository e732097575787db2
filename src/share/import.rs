use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::BundlerError;
use crate::store::{BundleStore, CatalogueStore};

use super::codec::SharePayload;

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedServer {
    /// Reference as carried by the payload (full id or 8-digit prefix).
    pub reference: String,
    pub server_id: String,
    pub name: String,
    pub package_index: usize,
    pub exact: bool,
    pub candidates: usize,
}

/// What an import would create, before anything is written.
#[derive(Debug, Clone, Serialize)]
pub struct ImportPreview {
    pub name: String,
    pub description: String,
    pub encoded_at: Option<DateTime<Utc>>,
    pub resolved: Vec<ResolvedServer>,
    pub unresolved: Vec<String>,
}

impl ImportPreview {
    /// Resolves every server reference against the catalogue. Fails only when
    /// none of them resolve.
    pub fn build(payload: &SharePayload, catalogue: &CatalogueStore) -> Result<Self, BundlerError> {
        let mut resolved: Vec<ResolvedServer> = Vec::new();
        let mut unresolved = Vec::new();

        for (reference, package_index) in payload.server_refs() {
            let Some(resolution) = catalogue.resolve(&reference) else {
                tracing::debug!(reference = %reference, "share reference did not resolve");
                unresolved.push(reference);
                continue;
            };
            let entry = resolution.entry;
            if resolution.candidates > 1 {
                tracing::warn!(
                    reference = %reference,
                    candidates = resolution.candidates,
                    chosen = %entry.id,
                    "share reference matches several servers; using the first"
                );
            }
            if resolved.iter().any(|r| r.server_id == entry.id) {
                continue;
            }

            let package_index = if package_index < entry.packages.len() || entry.packages.is_empty() {
                package_index
            } else {
                tracing::warn!(server = %entry.id, package_index, "package index out of range; using 0");
                0
            };
            resolved.push(ResolvedServer {
                reference,
                server_id: entry.id.clone(),
                name: entry.name.clone(),
                package_index,
                exact: resolution.exact,
                candidates: resolution.candidates,
            });
        }

        if resolved.is_empty() {
            return Err(BundlerError::NoValidServers);
        }

        Ok(Self {
            name: payload.name().to_string(),
            description: payload.description().unwrap_or_default().to_string(),
            encoded_at: payload.encoded_at(),
            resolved,
            unresolved,
        })
    }

    /// Creates the bundle through the ordinary create/add-server path and
    /// returns its id.
    pub fn commit(&self, bundles: &mut BundleStore) -> Result<String, BundlerError> {
        let id = bundles
            .create(self.name.clone(), self.description.clone())?
            .id
            .clone();
        for server in &self.resolved {
            bundles.add_server(&id, &server.server_id, server.package_index)?;
        }
        tracing::info!(id = %id, servers = self.resolved.len(), "imported shared bundle");
        Ok(id)
    }
}
