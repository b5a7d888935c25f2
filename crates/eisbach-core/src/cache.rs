//! Local persistence of fetched values.
//!
//! Values are stored per key as JSON `{"value": ..., "timestamp": <epoch ms>}`.
//! Entries written by older clients used `temperature` instead of `value`;
//! both are accepted on read.
//!
//! A stored entry is fresh while `now - timestamp < ttl`. Freshness is decided
//! by the reader; stores never expire entries on their own.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

/// A persisted value together with its capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedValue<T> {
    #[serde(alias = "temperature")]
    pub value: T,
    /// Capture time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl<T> CachedValue<T> {
    pub fn new(value: T, timestamp: i64) -> Self {
        Self { value, timestamp }
    }

    /// Age of the entry at `now_millis`. Entries from the future have age zero.
    pub fn age(&self, now_millis: i64) -> Duration {
        Duration::from_millis(now_millis.saturating_sub(self.timestamp).max(0) as u64)
    }

    /// Whether the entry is still fresh at `now_millis`.
    pub fn is_fresh(&self, now_millis: i64, ttl: Duration) -> bool {
        self.age(now_millis) < ttl
    }
}

/// Raw key/value storage for serialized cache entries.
///
/// There is no locking across read and write; concurrent writers to the same
/// key resolve as last-writer-wins.
pub trait CacheStore: Send + Sync {
    /// Read the raw entry for `key`, if present.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Write the raw entry for `key`.
    fn store(&self, key: &str, raw: &str) -> Result<()>;

    /// Delete the entry for `key`. Missing entries are not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Read and decode a cached value.
///
/// Undecodable entries are treated as absent.
pub fn read_cached<T: DeserializeOwned>(
    store: &dyn CacheStore,
    key: &str,
) -> Result<Option<CachedValue<T>>> {
    let Some(raw) = store.load(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(entry) => Ok(Some(entry)),
        Err(e) => {
            debug!(key, error = %e, "Ignoring undecodable cache entry");
            Ok(None)
        }
    }
}

/// Encode and write a cached value.
pub fn write_cached<T: Serialize>(
    store: &dyn CacheStore,
    key: &str,
    entry: &CachedValue<T>,
) -> Result<()> {
    let raw = serde_json::to_string(entry)?;
    store.store(key, &raw)
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Use `dir` for cache files. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The platform cache directory (`~/.cache/eisbach` on Linux).
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eisbach")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl CacheStore for FileCache {
    fn load(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, key: &str, raw: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path_for(key), raw)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(key, error = %e, "Failed to remove cache entry");
                Err(e.into())
            }
        }
    }
}

/// In-memory store, shared between data sources of one process.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn store(&self, key: &str, raw: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(key.to_string(), raw.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_freshness_boundary() {
        let entry = CachedValue::new(7.1, 1_000_000);
        let ttl_ms = HOUR.as_millis() as i64;

        assert!(entry.is_fresh(1_000_000, HOUR));
        assert!(entry.is_fresh(1_000_000 + ttl_ms - 1, HOUR));
        assert!(!entry.is_fresh(1_000_000 + ttl_ms, HOUR));
        assert!(!entry.is_fresh(1_000_000 + ttl_ms + 1, HOUR));
    }

    #[test]
    fn test_future_entry_has_zero_age() {
        let entry = CachedValue::new(1u32, 5_000);
        assert_eq!(entry.age(1_000), Duration::ZERO);
        assert!(entry.is_fresh(1_000, HOUR));
    }

    #[test]
    fn test_legacy_temperature_key() {
        let store = MemoryCache::new();
        store
            .store("eisbach.water_temperature", r#"{"temperature":7.1,"timestamp":42}"#)
            .unwrap();

        let entry: CachedValue<f64> = read_cached(&store, "eisbach.water_temperature")
            .unwrap()
            .unwrap();
        assert_eq!(entry, CachedValue::new(7.1, 42));
    }

    #[test]
    fn test_written_entry_uses_value_key() {
        let store = MemoryCache::new();
        write_cached(&store, "k", &CachedValue::new(3.5, 10)).unwrap();
        let raw = store.load("k").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["value"], 3.5);
        assert_eq!(json["timestamp"], 10);
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let store = MemoryCache::new();
        store.store("k", "{not json").unwrap();
        let entry: Option<CachedValue<f64>> = read_cached(&store, "k").unwrap();
        assert!(entry.is_none());
    }

    #[test]
    fn test_file_cache_roundtrip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("nested"));

        assert!(cache.load("eisbach.water_temperature").unwrap().is_none());
        write_cached(&cache, "eisbach.water_temperature", &CachedValue::new(9.0, 1)).unwrap();
        assert!(dir.path().join("nested/eisbach.water_temperature.json").exists());

        let entry: CachedValue<f64> = read_cached(&cache, "eisbach.water_temperature")
            .unwrap()
            .unwrap();
        assert_eq!(entry.value, 9.0);

        cache.remove("eisbach.water_temperature").unwrap();
        cache.remove("eisbach.water_temperature").unwrap();
        assert!(cache.load("eisbach.water_temperature").unwrap().is_none());
    }

    #[test]
    fn test_file_cache_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        cache.store("../escape/key", "{}").unwrap();
        assert!(dir.path().join(".._escape_key.json").exists());
    }

    #[test]
    fn test_memory_cache_last_writer_wins() {
        let store = MemoryCache::new();
        store.store("k", "1").unwrap();
        store.store("k", "2").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("2"));
        assert_eq!(store.len(), 1);
    }
}
