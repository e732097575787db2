use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::BundlerError;

use super::persist::WriteBehind;

/// Default lifetime of a cache entry.
pub fn default_max_age() -> chrono::Duration {
    chrono::Duration::hours(24)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    /// Lifetime in milliseconds.
    pub max_age: i64,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.timestamp).num_milliseconds() > self.max_age
    }
}

/// Keyed JSON cache with lazy expiry. Stale entries are evicted when read,
/// and every write sweeps out whatever else has expired.
pub struct CacheStore {
    record: WriteBehind<BTreeMap<String, CacheEntry>>,
}

impl CacheStore {
    pub fn open(path: PathBuf, delay: Duration) -> Result<Self, BundlerError> {
        Ok(Self {
            record: WriteBehind::load(path, delay)?,
        })
    }

    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now())
    }

    pub fn get_at<T: DeserializeOwned>(&mut self, key: &str, now: DateTime<Utc>) -> Option<T> {
        let entry = self.record.get().get(key)?;
        if entry.is_expired(now) {
            tracing::debug!(key, "cache entry expired");
            self.remove(key);
            return None;
        }
        serde_json::from_value(entry.data.clone()).ok()
    }

    pub fn put<T: Serialize>(
        &mut self,
        key: &str,
        data: &T,
        max_age: Option<chrono::Duration>,
    ) -> Result<(), BundlerError> {
        self.put_at(key, data, max_age, Utc::now())
    }

    pub fn put_at<T: Serialize>(
        &mut self,
        key: &str,
        data: &T,
        max_age: Option<chrono::Duration>,
        now: DateTime<Utc>,
    ) -> Result<(), BundlerError> {
        let entry = CacheEntry {
            data: serde_json::to_value(data)?,
            timestamp: now,
            max_age: max_age.unwrap_or_else(default_max_age).num_milliseconds(),
        };
        let entries = self.record.get_mut();
        let before = entries.len();
        entries.retain(|_, existing| !existing.is_expired(now));
        let pruned = before - entries.len();
        if pruned > 0 {
            tracing::debug!(pruned, "pruned expired cache entries");
        }
        entries.insert(key.to_string(), entry);
        self.record.touch(Instant::now());
        Ok(())
    }

    pub fn flush_if_due(&mut self, now: Instant) -> Result<bool, BundlerError> {
        self.record.flush_if_due(now)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.record.get_mut().remove(key).is_some();
        if removed {
            self.record.touch(Instant::now());
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.is_empty() {
            self.record.get_mut().clear();
            self.record.touch(Instant::now());
        }
    }

    pub fn len(&self) -> usize {
        self.record.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.get().is_empty()
    }

    pub fn flush(&mut self) -> Result<(), BundlerError> {
        self.record.flush()
    }
}
