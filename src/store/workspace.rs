use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::BundlerError;
use crate::model::{CatalogueEntry, Connection, Settings};

use super::crypto::PassphraseCipher;
use super::{BundleStore, CacheStore, CatalogueStore, ConnectionRegistry, CredentialStore};

/// Catalogue search result, small enough to keep in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub packages: usize,
}

impl From<&CatalogueEntry> for SearchHit {
    fn from(entry: &CatalogueEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            description: entry.description.clone(),
            packages: entry.packages.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub hits: Vec<SearchHit>,
    pub from_cache: bool,
}

/// Every store of one data directory, opened together and passed around
/// explicitly by the CLI and MCP server.
pub struct Workspace {
    root: PathBuf,
    settings: Settings,
    catalogue_override: Option<PathBuf>,
    pub bundles: BundleStore,
    pub connections: ConnectionRegistry,
    pub credentials: CredentialStore,
    pub cache: CacheStore,
}

impl Workspace {
    pub fn open(data_dir: Option<&Path>, catalogue: Option<&Path>) -> Result<Self, BundlerError> {
        let root = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_data_dir()?,
        };
        fs::create_dir_all(&root).map_err(|source| BundlerError::DirCreate {
            path: root.clone(),
            source,
        })?;

        let settings = load_settings(&root)?;
        let delay = Duration::from_millis(settings.persist_delay_ms);
        tracing::debug!(root = %root.display(), delay_ms = settings.persist_delay_ms, "opening workspace");

        Ok(Self {
            bundles: BundleStore::open(root.join("bundles.json"), delay)?,
            connections: ConnectionRegistry::open(root.join("connections.json"), delay)?,
            credentials: CredentialStore::open(
                root.join("credentials.json"),
                delay,
                PassphraseCipher::default(),
            )?,
            cache: CacheStore::open(root.join("cache.json"), delay)?,
            catalogue_override: catalogue.map(Path::to_path_buf),
            settings,
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn save_settings(&self) -> Result<(), BundlerError> {
        let path = self.root.join("config.toml");
        let content = toml::to_string_pretty(&self.settings)?;
        fs::write(&path, content).map_err(|source| BundlerError::FileWrite { path, source })?;
        Ok(())
    }

    /// `--catalogue` flag, then the `catalogue_path` setting, then
    /// `catalogue.json` in the data directory.
    pub fn catalogue_path(&self) -> PathBuf {
        self.catalogue_override
            .clone()
            .or_else(|| self.settings.catalogue_path.clone())
            .unwrap_or_else(|| self.root.join("catalogue.json"))
    }

    pub fn catalogue(&self) -> Result<CatalogueStore, BundlerError> {
        CatalogueStore::open(&self.catalogue_path())
    }

    /// Searches the catalogue and caches the result. When the catalogue is
    /// unavailable, or offline mode is on, the last cached result for the same
    /// query is returned instead.
    pub fn search_catalogue(
        &mut self,
        query: &str,
        category: Option<&str>,
    ) -> Result<SearchOutcome, BundlerError> {
        let key = format!("search:{}|{}", query.trim().to_lowercase(), category.unwrap_or_default());

        if self.settings.offline_mode {
            if let Some(hits) = self.cache.get::<Vec<SearchHit>>(&key) {
                return Ok(SearchOutcome {
                    hits,
                    from_cache: true,
                });
            }
        }

        let catalogue = match self.catalogue() {
            Ok(catalogue) => catalogue,
            Err(err) => {
                let Some(hits) = self.cache.get::<Vec<SearchHit>>(&key) else {
                    return Err(err);
                };
                tracing::warn!(error = %err, "catalogue unavailable; using cached search results");
                return Ok(SearchOutcome {
                    hits,
                    from_cache: true,
                });
            }
        };

        let needle = query.trim().to_lowercase();
        let entries: Vec<&CatalogueEntry> = match category {
            Some(category) => catalogue
                .by_category(category)
                .into_iter()
                .filter(|e| needle.is_empty() || e.matches_text(&needle))
                .collect(),
            None => catalogue.search(query),
        };
        let hits: Vec<SearchHit> = entries.into_iter().map(SearchHit::from).collect();
        tracing::debug!(source = %catalogue.source().display(), hits = hits.len(), "searched catalogue");
        self.cache.put(&key, &hits, None)?;
        Ok(SearchOutcome {
            hits,
            from_cache: false,
        })
    }

    /// Deletes a connection unless a bundle still references it.
    pub fn delete_connection(&mut self, id_or_name: &str) -> Result<Connection, BundlerError> {
        let id = self.connections.find(id_or_name)?.id.clone();
        self.connections.delete(&id, &self.bundles)
    }

    /// Writes every dirty store immediately.
    pub fn flush(&mut self) -> Result<(), BundlerError> {
        self.bundles.flush()?;
        self.connections.flush()?;
        self.credentials.flush()?;
        self.cache.flush()?;
        Ok(())
    }

    /// Writes the stores whose debounce window has closed by `now`. Returns
    /// whether anything was written.
    pub fn flush_if_due(&mut self, now: Instant) -> Result<bool, BundlerError> {
        let mut wrote = self.bundles.flush_if_due(now)?;
        wrote |= self.connections.flush_if_due(now)?;
        wrote |= self.credentials.flush_if_due(now)?;
        wrote |= self.cache.flush_if_due(now)?;
        Ok(wrote)
    }
}

fn default_data_dir() -> Result<PathBuf, BundlerError> {
    dirs::data_dir()
        .map(|d| d.join("mcp-bundler"))
        .ok_or(BundlerError::DataDirNotFound)
}

fn load_settings(root: &Path) -> Result<Settings, BundlerError> {
    let path = root.join("config.toml");
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = fs::read_to_string(&path).map_err(|source| BundlerError::FileRead {
        path: path.clone(),
        source,
    })?;
    let settings: Settings = toml::from_str(&content)?;
    Ok(settings)
}
