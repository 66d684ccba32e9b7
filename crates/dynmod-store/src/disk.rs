//! On-disk store
//!
//! Directory structure:
//! ```text
//! <root>/
//! ├── 3f/
//! │   └── 3fa9c0...e1.json
//! ├── a7/
//! │   └── a70b12...4d.json
//! └── tmp/
//! ```

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dynmod_loader::CacheStore;
use tracing::{debug, warn};

use crate::StoreError;

static TMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Compilation cache store backed by a directory.
///
/// Entries are written to `tmp/` first and renamed into place, so readers
/// never observe a partially written entry.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(root.join("tmp"))?;
        Ok(Self { root })
    }

    /// Open the store at the default location
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(Self::default_dir()?)
    }

    /// Default cache directory (~/.dynmod/cache/)
    pub fn default_dir() -> Result<PathBuf, StoreError> {
        let home = dirs::home_dir()
            .ok_or_else(|| StoreError::InitError("Could not determine home directory".to_string()))?;
        Ok(home.join(".dynmod").join("cache"))
    }

    /// Get the store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the entry file for `key`
    pub fn entry_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(&key[..2]).join(format!("{}.json", key)))
    }

    /// Read an entry. A missing entry is `Ok(None)`.
    pub fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write an entry atomically, replacing any previous value
    pub fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let final_path = self.entry_path(key)?;
        if let Some(shard) = final_path.parent() {
            fs::create_dir_all(shard)?;
        }

        let tmp_dir = self.root.join("tmp");
        fs::create_dir_all(&tmp_dir)?;
        let tmp_path = tmp_dir.join(format!(
            "{}.{}.{}.tmp",
            key,
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let mut tmp_file = fs::File::create(&tmp_path)?;
        tmp_file.write_all(value.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        if let Err(e) = fs::rename(&tmp_path, &final_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Check if an entry exists
    pub fn contains(&self, key: &str) -> bool {
        self.entry_path(key).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Number of stored entries
    pub fn len(&self) -> Result<usize, StoreError> {
        let mut count = 0;
        for shard in self.shards()? {
            for entry in fs::read_dir(&shard)? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// Check if the store holds no entries
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Delete every entry
    ///
    /// **Warning:** This deletes all cached compilation results!
    pub fn clear(&self) -> Result<(), StoreError> {
        for shard in self.shards()? {
            fs::remove_dir_all(&shard)?;
        }
        let tmp_dir = self.root.join("tmp");
        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir)?;
        }
        fs::create_dir_all(&tmp_dir)?;
        Ok(())
    }

    fn shards(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut shards = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(shards),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let path = entry?.path();
            let is_shard = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.len() == 2 && is_hex(name));
            if is_shard && path.is_dir() {
                shards.push(path);
            }
        }
        Ok(shards)
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &str) -> Option<String> {
        let store = self.clone();
        let key = key.to_string();
        let result = tokio::task::spawn_blocking(move || store.read(&key)).await;
        match result {
            Ok(Ok(entry)) => entry,
            Ok(Err(e)) => {
                warn!(target: "dynmod::cache", root = %self.root.display(), error = %e, "cache read failed");
                None
            }
            Err(e) => {
                warn!(target: "dynmod::cache", error = %e, "cache read task failed");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: String) {
        let store = self.clone();
        let owned_key = key.to_string();
        let result = tokio::task::spawn_blocking(move || store.write(&owned_key, &value)).await;
        match result {
            Ok(Ok(())) => debug!(target: "dynmod::cache", %key, "cache entry written"),
            Ok(Err(e)) => {
                warn!(target: "dynmod::cache", %key, error = %e, "cache write failed");
            }
            Err(e) => {
                warn!(target: "dynmod::cache", %key, error = %e, "cache write task failed");
            }
        }
    }
}

fn is_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.len() < 2 || !is_hex(key) {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
