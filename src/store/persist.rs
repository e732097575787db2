use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::BundlerError;

/// In-memory record with trailing-edge debounced write-through to a JSON file.
///
/// Mutations call [`WriteBehind::touch`]; the record is written once the
/// delay has elapsed since the last touch ([`WriteBehind::flush_if_due`]) or
/// immediately on [`WriteBehind::flush`]. Reads always see the in-memory
/// value.
pub struct WriteBehind<T> {
    path: PathBuf,
    value: T,
    delay: Duration,
    dirty: bool,
    deadline: Option<Instant>,
}

impl<T: Serialize + DeserializeOwned + Default> WriteBehind<T> {
    /// Loads `path`, starting from `T::default()` when the file does not exist.
    pub fn load(path: PathBuf, delay: Duration) -> Result<Self, BundlerError> {
        let value = if path.exists() {
            read_json(&path)?
        } else {
            T::default()
        };
        Ok(Self {
            path,
            value,
            delay,
            dirty: false,
            deadline: None,
        })
    }
}

impl<T: Serialize> WriteBehind<T> {
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Mutable access; the caller must [`touch`](Self::touch) afterwards.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the record dirty and pushes the write deadline out.
    pub fn touch(&mut self, now: Instant) {
        self.dirty = true;
        self.deadline = Some(now + self.delay);
    }

    /// Writes the record if it is dirty and the debounce window has closed.
    /// Returns whether a write happened.
    pub fn flush_if_due(&mut self, now: Instant) -> Result<bool, BundlerError> {
        match self.deadline {
            Some(deadline) if self.dirty && now >= deadline => {
                self.flush()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Writes the current snapshot if dirty, regardless of the deadline.
    pub fn flush(&mut self) -> Result<(), BundlerError> {
        if !self.is_dirty() {
            return Ok(());
        }
        write_json(&self.path, &self.value)?;
        tracing::debug!(path = %self.path.display(), "flushed store");
        self.dirty = false;
        self.deadline = None;
        Ok(())
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, BundlerError> {
    let content = fs::read_to_string(path).map_err(|source| BundlerError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| BundlerError::JsonParse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), BundlerError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| BundlerError::DirCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let content = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content + "\n").map_err(|source| BundlerError::FileWrite {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| BundlerError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
