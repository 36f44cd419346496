use crate::error::Result;
use crate::models::cache::{CacheEntry, CacheMap};
use crate::utils::clock::Clock;
use chrono::{Duration, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Persistent key → entry map with write-through on every update.
///
/// All mutations hold the map lock until the file has been rewritten, so two
/// workers finishing together cannot clobber each other's keys.
pub struct CacheStore {
    path: PathBuf,
    entries: Mutex<CacheMap>,
    clock: Arc<Clock>,
}

impl CacheStore {
    /// Reads the cache file. A missing or unreadable file yields an empty cache.
    pub fn load(path: impl Into<PathBuf>, clock: Arc<Clock>) -> Self {
        let path = path.into();
        let entries = match read_map(&path) {
            Ok(Some(map)) => {
                info!(path = %path.display(), entries = map.len(), "Loaded cache");
                map
            }
            Ok(None) => {
                debug!(path = %path.display(), "No cache file, starting empty");
                CacheMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding unreadable cache file");
                CacheMap::new()
            }
        };

        Self {
            path,
            entries: Mutex::new(entries),
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.lock().get(key).cloned()
    }

    /// Stores `value` under `key` stamped with the real wall clock, then
    /// persists the whole map before returning.
    pub fn put(&self, key: &str, value: impl Into<String>) {
        let mut entries = self.lock();
        entries.insert(key.to_string(), CacheEntry::new(value, Utc::now()));
        debug!(key, "Cache updated");
        persist_or_warn(&self.path, &entries);
    }

    /// Fresh iff less than `max_age` has passed since the entry was fetched,
    /// measured against the (possibly simulated) clock.
    pub fn is_fresh(&self, entry: &CacheEntry, max_age: std::time::Duration) -> bool {
        let max_age = Duration::from_std(max_age).unwrap_or(Duration::MAX);
        entry.is_fresh_at(self.clock.now(), max_age)
    }

    /// Fresh entry for `key`, if one exists.
    pub fn get_fresh(&self, key: &str, max_age: std::time::Duration) -> Option<CacheEntry> {
        self.get(key).filter(|entry| self.is_fresh(entry, max_age))
    }

    /// Moves the entry at `source` to `dest`, keeping its fetch time.
    /// Returns false and leaves the cache untouched if `source` is absent.
    pub fn rotate(&self, source: &str, dest: &str) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.remove(source) else {
            debug!(source, dest, "Nothing to rotate");
            return false;
        };
        entries.insert(dest.to_string(), entry);
        info!(source, dest, "Rotated cache entry");
        persist_or_warn(&self.path, &entries);
        true
    }

    /// Empties the cache and removes its file.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.clear();
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "Cache cleared"),
            Err(e) if e.kind() == ErrorKind::NotFound => info!("Cache cleared"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to delete cache file"),
        }
    }

    /// Writes the whole map to disk.
    pub fn save(&self) -> Result<()> {
        let entries = self.lock();
        write_map(&self.path, &entries)
    }

    /// All entries sorted by key.
    pub fn snapshot(&self) -> Vec<(String, CacheEntry)> {
        let mut items: Vec<_> = self
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        items
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, CacheMap> {
        // Every critical section leaves the map consistent; poisoning is ignored.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn read_map(path: &Path) -> Result<Option<CacheMap>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Serializes to a sibling temp file and renames it over the target.
fn write_map(path: &Path, entries: &CacheMap) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(entries)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn persist_or_warn(path: &Path, entries: &CacheMap) {
    if let Err(e) = write_map(path, entries) {
        warn!(path = %path.display(), error = %e, "Cache persist failed, keeping in-memory copy");
    }
}
