use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::error::BundlerError;
use crate::model::{Connection, ConnectionIndex, ConnectionUpdate, Package};

use super::persist::WriteBehind;

/// Answers which bundles still point at a connection. Implemented by the
/// bundle store so the registry can refuse deletes without knowing bundle
/// internals.
pub trait ConnectionReferences {
    fn bundles_referencing(&self, connection_id: &str) -> Vec<String>;
}

pub struct ConnectionRegistry {
    record: WriteBehind<ConnectionIndex>,
}

impl ConnectionRegistry {
    pub fn open(path: PathBuf, delay: Duration) -> Result<Self, BundlerError> {
        Ok(Self {
            record: WriteBehind::load(path, delay)?,
        })
    }

    pub fn list(&self) -> &[Connection] {
        &self.record.get().connections
    }

    pub fn create(
        &mut self,
        name: String,
        server_id: String,
        package_id: String,
        credentials: BTreeMap<String, String>,
    ) -> &Connection {
        let now = Utc::now();
        let connection = Connection {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            server_id,
            package_id,
            credentials,
            created: now,
            updated: now,
        };
        tracing::info!(id = %connection.id, server = %connection.server_id, "created connection");

        self.mark_changed();
        let connections = &mut self.record.get_mut().connections;
        connections.push(connection);
        &connections[connections.len() - 1]
    }

    pub fn update(&mut self, id: &str, update: ConnectionUpdate) -> Result<&Connection, BundlerError> {
        let connection = self.get_mut(id)?;
        if let Some(name) = update.name {
            connection.name = name;
        }
        if let Some(server_id) = update.server_id {
            connection.server_id = server_id;
        }
        if let Some(package_id) = update.package_id {
            connection.package_id = package_id;
        }
        if let Some(credentials) = update.credentials {
            connection.credentials = credentials;
        }
        connection.updated = Utc::now();

        self.mark_changed();
        self.require(id)
    }

    /// Removes a connection unless a bundle still references it.
    pub fn delete(
        &mut self,
        id: &str,
        references: &impl ConnectionReferences,
    ) -> Result<Connection, BundlerError> {
        let position = self.position(id)?;
        let bundles = references.bundles_referencing(id);
        if !bundles.is_empty() {
            return Err(BundlerError::ConnectionInUse {
                id: id.to_string(),
                bundles,
            });
        }

        let removed = self.record.get_mut().connections.remove(position);
        tracing::info!(id, "deleted connection");
        self.mark_changed();
        Ok(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Connection> {
        self.list().iter().find(|c| c.id == id)
    }

    pub fn get_by_server_id(&self, server_id: &str) -> Vec<&Connection> {
        self.list().iter().filter(|c| c.server_id == server_id).collect()
    }

    pub fn get_by_package_id(&self, package_id: &str) -> Vec<&Connection> {
        self.list()
            .iter()
            .filter(|c| c.package_id == package_id)
            .collect()
    }

    pub fn get_by_server_and_package(&self, server_id: &str, package_id: &str) -> Vec<&Connection> {
        self.list()
            .iter()
            .filter(|c| c.server_id == server_id && c.package_id == package_id)
            .collect()
    }

    /// Looks a connection up by id, falling back to a unique name match.
    pub fn find(&self, id_or_name: &str) -> Result<&Connection, BundlerError> {
        if let Some(connection) = self.get(id_or_name) {
            return Ok(connection);
        }
        let mut named = self.list().iter().filter(|c| c.name == id_or_name);
        match (named.next(), named.next()) {
            (Some(connection), None) => Ok(connection),
            (Some(_), Some(_)) => Err(BundlerError::AmbiguousName {
                kind: "connection",
                name: id_or_name.to_string(),
            }),
            _ => Err(BundlerError::ConnectionNotFound {
                id: id_or_name.to_string(),
            }),
        }
    }

    pub fn set_credential(&mut self, id: &str, name: &str, value: &str) -> Result<(), BundlerError> {
        let connection = self.get_mut(id)?;
        connection
            .credentials
            .insert(name.to_string(), value.to_string());
        connection.updated = Utc::now();
        self.mark_changed();
        Ok(())
    }

    pub fn remove_credential(&mut self, id: &str, name: &str) -> Result<Option<String>, BundlerError> {
        let connection = self.get_mut(id)?;
        let removed = connection.credentials.remove(name);
        connection.updated = Utc::now();
        self.mark_changed();
        Ok(removed)
    }

    /// With a package spec: every required variable has a non-blank value.
    /// Without one this only checks that any credential is stored at all.
    pub fn has_required_credentials(
        &self,
        id: &str,
        package: Option<&Package>,
    ) -> Result<bool, BundlerError> {
        let connection = self.require(id)?;
        Ok(match package {
            Some(package) => package
                .environment_variables
                .iter()
                .filter(|v| v.is_required)
                .all(|v| connection.credential(&v.name).is_some()),
            None => !connection.credentials.is_empty(),
        })
    }

    /// Names of required variables of `package` the connection leaves blank.
    pub fn missing_credentials(&self, id: &str, package: &Package) -> Result<Vec<String>, BundlerError> {
        let connection = self.require(id)?;
        Ok(package
            .environment_variables
            .iter()
            .filter(|v| v.is_required && connection.credential(&v.name).is_none())
            .map(|v| v.name.clone())
            .collect())
    }

    pub fn flush(&mut self) -> Result<(), BundlerError> {
        self.record.flush()
    }

    pub fn flush_if_due(&mut self, now: Instant) -> Result<bool, BundlerError> {
        self.record.flush_if_due(now)
    }

    fn require(&self, id: &str) -> Result<&Connection, BundlerError> {
        self.get(id).ok_or_else(|| BundlerError::ConnectionNotFound { id: id.to_string() })
    }

    fn position(&self, id: &str) -> Result<usize, BundlerError> {
        self.list()
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| BundlerError::ConnectionNotFound { id: id.to_string() })
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Connection, BundlerError> {
        let position = self.position(id)?;
        Ok(&mut self.record.get_mut().connections[position])
    }

    fn mark_changed(&mut self) {
        self.record.get_mut().updated = Some(Utc::now());
        self.record.touch(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    struct FixedReferences(Vec<String>);

    impl ConnectionReferences for FixedReferences {
        fn bundles_referencing(&self, _connection_id: &str) -> Vec<String> {
            self.0.clone()
        }
    }

    fn registry(dir: &TempDir) -> ConnectionRegistry {
        ConnectionRegistry::open(dir.path().join("connections.json"), Duration::ZERO).unwrap()
    }

    fn package() -> Package {
        serde_json::from_value(serde_json::json!({
            "registry_name": "npm",
            "package_name": "@org/tool",
            "environment_variables": [
                { "name": "API_KEY", "is_required": true, "is_secret": true },
                { "name": "REGION", "is_required": true },
                { "name": "LOG_LEVEL" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn create_then_lookup_by_server_and_package() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry(&dir);
        let id = registry
            .create("work".into(), "srv".into(), "srv::npm::@org/tool".into(), BTreeMap::new())
            .id
            .clone();
        registry.create("other".into(), "srv2".into(), "srv2::npm::x".into(), BTreeMap::new());

        assert_eq!(registry.get_by_server_id("srv").len(), 1);
        assert_eq!(registry.get_by_package_id("srv::npm::@org/tool")[0].id, id);
        assert_eq!(registry.get_by_server_and_package("srv", "srv2::npm::x").len(), 0);
        assert_eq!(registry.find("work").unwrap().id, id);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry(&dir);
        let err = registry.update("nope", ConnectionUpdate::default()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn single_key_mutations_refresh_updated() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry(&dir);
        let connection = registry
            .create("c".into(), "s".into(), "p".into(), BTreeMap::new())
            .clone();

        registry.set_credential(&connection.id, "API_KEY", "sk-1").unwrap();
        let after_set = registry.get(&connection.id).unwrap().clone();
        assert_eq!(after_set.credentials["API_KEY"], "sk-1");
        assert!(after_set.updated >= connection.updated);

        let removed = registry.remove_credential(&connection.id, "API_KEY").unwrap();
        assert_eq!(removed.as_deref(), Some("sk-1"));
        assert!(registry.get(&connection.id).unwrap().credentials.is_empty());
    }

    #[test]
    fn required_credentials_check_with_and_without_package() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry(&dir);
        let id = registry
            .create(
                "c".into(),
                "s".into(),
                "p".into(),
                BTreeMap::from([("API_KEY".to_string(), "sk".to_string())]),
            )
            .id
            .clone();
        let pkg = package();

        assert!(registry.has_required_credentials(&id, None).unwrap());
        assert!(!registry.has_required_credentials(&id, Some(&pkg)).unwrap());
        assert_eq!(registry.missing_credentials(&id, &pkg).unwrap(), vec!["REGION"]);

        registry.set_credential(&id, "REGION", "  ").unwrap();
        assert!(!registry.has_required_credentials(&id, Some(&pkg)).unwrap());
        registry.set_credential(&id, "REGION", "eu").unwrap();
        assert!(registry.has_required_credentials(&id, Some(&pkg)).unwrap());
    }

    #[test]
    fn delete_is_refused_while_referenced() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry(&dir);
        let id = registry
            .create("c".into(), "s".into(), "p".into(), BTreeMap::new())
            .id
            .clone();

        let err = registry
            .delete(&id, &FixedReferences(vec!["bundle-1".into()]))
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(registry.get(&id).is_some());

        registry.delete(&id, &FixedReferences(Vec::new())).unwrap();
        assert!(registry.get(&id).is_none());
    }

    #[test]
    fn flushed_connections_reload() {
        let dir = TempDir::new().unwrap();
        let mut registry = registry(&dir);
        let id = registry
            .create("persisted".into(), "s".into(), "p".into(), BTreeMap::new())
            .id
            .clone();
        registry.flush().unwrap();

        let reopened = super::ConnectionRegistry::open(
            dir.path().join("connections.json"),
            Duration::ZERO,
        )
        .unwrap();
        assert_eq!(reopened.get(&id).unwrap().name, "persisted");
    }
}
