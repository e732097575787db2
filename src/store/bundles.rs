use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::error::BundlerError;
use crate::model::{Bundle, BundleIndex, BundleServerEntry, BundleUpdate, Connection};

use super::connections::{ConnectionReferences, ConnectionRegistry};
use super::persist::WriteBehind;

pub struct BundleStore {
    record: WriteBehind<BundleIndex>,
}

impl BundleStore {
    pub fn open(path: PathBuf, delay: Duration) -> Result<Self, BundlerError> {
        Ok(Self {
            record: WriteBehind::load(path, delay)?,
        })
    }

    pub fn list(&self) -> &[Bundle] {
        &self.record.get().bundles
    }

    pub fn list_tagged(&self, tag: Option<&str>) -> Vec<&Bundle> {
        self.list()
            .iter()
            .filter(|b| tag.is_none_or(|t| b.tags.iter().any(|bt| bt == t)))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Bundle> {
        self.list().iter().find(|b| b.id == id)
    }

    /// Looks a bundle up by id, falling back to a unique name match.
    pub fn find(&self, id_or_name: &str) -> Result<&Bundle, BundlerError> {
        if let Some(bundle) = self.get(id_or_name) {
            return Ok(bundle);
        }
        let mut named = self.list().iter().filter(|b| b.name == id_or_name);
        match (named.next(), named.next()) {
            (Some(bundle), None) => Ok(bundle),
            (Some(_), Some(_)) => Err(BundlerError::AmbiguousName {
                kind: "bundle",
                name: id_or_name.to_string(),
            }),
            _ => Err(BundlerError::BundleNotFound {
                id: id_or_name.to_string(),
            }),
        }
    }

    /// Creates an empty bundle and writes it out right away rather than
    /// waiting for the debounce window.
    pub fn create(&mut self, name: String, description: String) -> Result<&Bundle, BundlerError> {
        let now = Utc::now();
        let bundle = Bundle {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description,
            servers: Vec::new(),
            tags: Vec::new(),
            created: now,
            updated: now,
        };
        tracing::info!(id = %bundle.id, name = %bundle.name, "created bundle");

        self.record.get_mut().bundles.push(bundle);
        self.mark_changed();
        self.record.flush()?;
        let bundles = self.list();
        Ok(&bundles[bundles.len() - 1])
    }

    pub fn update(&mut self, id: &str, update: BundleUpdate) -> Result<&Bundle, BundlerError> {
        let bundle = self.get_mut(id)?;
        if let Some(name) = update.name {
            bundle.name = name;
        }
        if let Some(description) = update.description {
            bundle.description = description;
        }
        if let Some(tags) = update.tags {
            bundle.tags = tags;
        }
        bundle.updated = Utc::now();
        self.mark_changed();
        self.require(id)
    }

    /// Removes a bundle. Connections it referenced are left in place.
    pub fn delete(&mut self, id: &str) -> Result<Bundle, BundlerError> {
        let position = self.position(id)?;
        let removed = self.record.get_mut().bundles.remove(position);
        tracing::info!(id, "deleted bundle");
        self.mark_changed();
        Ok(removed)
    }

    /// Adds `server_id` to the bundle. A server already present is left as is,
    /// whatever package index was asked for. Returns whether an entry was added.
    pub fn add_server(
        &mut self,
        bundle_id: &str,
        server_id: &str,
        package_index: usize,
    ) -> Result<bool, BundlerError> {
        let bundle = self.get_mut(bundle_id)?;
        if bundle.entry(server_id).is_some() {
            return Ok(false);
        }
        bundle
            .servers
            .push(BundleServerEntry::new(server_id, package_index));
        bundle.updated = Utc::now();
        self.mark_changed();
        Ok(true)
    }

    /// Removes the server entry, and with it any attached connection.
    /// Returns whether an entry was removed.
    pub fn remove_server(&mut self, bundle_id: &str, server_id: &str) -> Result<bool, BundlerError> {
        let bundle = self.get_mut(bundle_id)?;
        let before = bundle.servers.len();
        bundle.servers.retain(|e| e.server_id != server_id);
        if bundle.servers.len() == before {
            return Ok(false);
        }
        bundle.updated = Utc::now();
        self.mark_changed();
        Ok(true)
    }

    /// Changes the package selection of a bundled server.
    pub fn set_package(
        &mut self,
        bundle_id: &str,
        server_id: &str,
        package_index: usize,
    ) -> Result<(), BundlerError> {
        let bundle = self.get_mut(bundle_id)?;
        let bundle_name = bundle.name.clone();
        let entry = bundle
            .entry_mut(server_id)
            .ok_or_else(|| BundlerError::ServerNotInBundle {
                bundle: bundle_name,
                server: server_id.to_string(),
            })?;
        entry.package_index = package_index;
        bundle.updated = Utc::now();
        self.mark_changed();
        Ok(())
    }

    /// Points a bundled server at a connection. The connection's own
    /// server/package scope is not checked against the entry.
    pub fn attach_connection(
        &mut self,
        bundle_id: &str,
        server_id: &str,
        connection_id: &str,
    ) -> Result<(), BundlerError> {
        let bundle = self.get_mut(bundle_id)?;
        let bundle_name = bundle.name.clone();
        let entry = bundle
            .entry_mut(server_id)
            .ok_or_else(|| BundlerError::ServerNotInBundle {
                bundle: bundle_name,
                server: server_id.to_string(),
            })?;
        entry.connection_id = Some(connection_id.to_string());
        bundle.updated = Utc::now();
        tracing::debug!(bundle = bundle_id, server = server_id, connection = connection_id, "attached connection");
        self.mark_changed();
        Ok(())
    }

    /// Clears the connection of a bundled server. Returns whether one was set.
    pub fn detach_connection(&mut self, bundle_id: &str, server_id: &str) -> Result<bool, BundlerError> {
        let bundle = self.get_mut(bundle_id)?;
        let Some(entry) = bundle.entry_mut(server_id) else {
            return Ok(false);
        };
        if entry.connection_id.take().is_none() {
            return Ok(false);
        }
        bundle.updated = Utc::now();
        self.mark_changed();
        Ok(true)
    }

    /// Resolves the connection attached to a bundled server, if any.
    pub fn get_server_connection<'a>(
        &self,
        bundle_id: &str,
        server_id: &str,
        connections: &'a ConnectionRegistry,
    ) -> Result<Option<&'a Connection>, BundlerError> {
        let bundle = self.require(bundle_id)?;
        Ok(bundle
            .entry(server_id)
            .and_then(|e| e.connection_id.as_deref())
            .and_then(|id| connections.get(id)))
    }

    pub fn flush(&mut self) -> Result<(), BundlerError> {
        self.record.flush()
    }

    pub fn flush_if_due(&mut self, now: Instant) -> Result<bool, BundlerError> {
        self.record.flush_if_due(now)
    }

    fn require(&self, id: &str) -> Result<&Bundle, BundlerError> {
        self.get(id)
            .ok_or_else(|| BundlerError::BundleNotFound { id: id.to_string() })
    }

    fn position(&self, id: &str) -> Result<usize, BundlerError> {
        self.list()
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| BundlerError::BundleNotFound { id: id.to_string() })
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Bundle, BundlerError> {
        let position = self.position(id)?;
        Ok(&mut self.record.get_mut().bundles[position])
    }

    fn mark_changed(&mut self) {
        self.record.get_mut().updated = Some(Utc::now());
        self.record.touch(Instant::now());
    }
}

impl ConnectionReferences for BundleStore {
    fn bundles_referencing(&self, connection_id: &str) -> Vec<String> {
        self.list()
            .iter()
            .filter(|b| b.references_connection(connection_id))
            .map(|b| b.name.clone())
            .collect()
    }
}
