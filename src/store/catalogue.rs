use std::path::{Path, PathBuf};

use crate::error::BundlerError;
use crate::model::CatalogueEntry;

use super::persist::read_json;

/// Read-only catalogue of MCP servers, loaded from a JSON array file or a
/// directory of per-entry JSON files. Entries are kept sorted by id so prefix
/// resolution is deterministic.
pub struct CatalogueStore {
    source: PathBuf,
    entries: Vec<CatalogueEntry>,
}

/// Outcome of resolving a (possibly truncated) server reference.
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub entry: &'a CatalogueEntry,
    pub exact: bool,
    /// Number of catalogue entries sharing the prefix (1 when unambiguous).
    pub candidates: usize,
}

impl CatalogueStore {
    pub fn open(source: &Path) -> Result<Self, BundlerError> {
        let unavailable = |reason: String| BundlerError::CatalogueUnavailable {
            path: source.to_path_buf(),
            reason,
        };

        let mut entries: Vec<CatalogueEntry> = if source.is_dir() {
            let mut entries = Vec::new();
            for item in walkdir::WalkDir::new(source).min_depth(1).sort_by_file_name() {
                let item = item.map_err(|e| unavailable(e.to_string()))?;
                let is_json = item.path().extension().is_some_and(|ext| ext == "json");
                if item.file_type().is_file() && is_json {
                    entries.push(read_json(item.path()).map_err(|e| unavailable(e.to_string()))?);
                }
            }
            entries
        } else if source.is_file() {
            read_json(source).map_err(|e| unavailable(e.to_string()))?
        } else {
            return Err(unavailable("no catalogue file or directory".to_string()));
        };

        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries.dedup_by(|a, b| a.id == b.id);
        tracing::debug!(source = %source.display(), entries = entries.len(), "opened catalogue");

        Ok(Self {
            source: source.to_path_buf(),
            entries,
        })
    }

    pub fn from_entries(mut entries: Vec<CatalogueEntry>) -> Self {
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            source: PathBuf::new(),
            entries,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn get(&self, id: &str) -> Option<&CatalogueEntry> {
        self.entries
            .binary_search_by(|e| e.id.as_str().cmp(id))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn list(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    pub fn by_category(&self, category: &str) -> Vec<&CatalogueEntry> {
        self.entries
            .iter()
            .filter(|e| e.categories.iter().any(|c| c.eq_ignore_ascii_case(category)))
            .collect()
    }

    /// Case-insensitive substring search over id, name, description,
    /// categories and keywords.
    pub fn search(&self, query: &str) -> Vec<&CatalogueEntry> {
        let needle = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| needle.is_empty() || e.matches_text(&needle))
            .collect()
    }

    /// Exact id match first, then the first id (in id order) starting with
    /// `reference`. Prefix collisions are reported but not rejected.
    pub fn resolve(&self, reference: &str) -> Option<Resolution<'_>> {
        if reference.is_empty() {
            return None;
        }
        if let Some(entry) = self.get(reference) {
            return Some(Resolution {
                entry,
                exact: true,
                candidates: 1,
            });
        }

        let start = self.entries.partition_point(|e| e.id.as_str() < reference);
        let matching: Vec<&CatalogueEntry> = self.entries[start..]
            .iter()
            .take_while(|e| e.id.starts_with(reference))
            .collect();
        let entry = *matching.first()?;
        if matching.len() > 1 {
            tracing::warn!(
                prefix = reference,
                candidates = matching.len(),
                chosen = %entry.id,
                "server id prefix is ambiguous"
            );
        }
        Some(Resolution {
            entry,
            exact: false,
            candidates: matching.len(),
        })
    }
}
