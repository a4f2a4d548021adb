use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, warn};

use crate::history::History;
use crate::i18n::Locale;

pub const HISTORY_KEY: &str = "studyTimerHistory";
pub const LANG_KEY: &str = "studyTimerLang";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage is unavailable")]
    Unavailable,
}

/// String values under fixed keys
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;

        // write beside the target and swap it in, a failed write leaves the old value
        let target = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.tmp"));
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &target).map_err(io_err)?;
        Ok(())
    }
}

/// In-process store for tests and for runs without a usable state directory
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `set` fail, as a full disk or quota would
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Seed a raw value, bypassing the write failure switch
    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().map_err(|_| StorageError::Unavailable)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                key: key.to_string(),
                source: io::Error::new(io::ErrorKind::Other, "quota exceeded"),
            });
        }
        let mut values = self.values.lock().map_err(|_| StorageError::Unavailable)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persists the whole [`History`] under [`HISTORY_KEY`]
#[derive(Clone)]
pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Read the stored history.
    ///
    /// Missing, unreadable and malformed data all come back as an empty
    /// history; the bad value is left to be overwritten by the next save.
    pub fn load(&self) -> History {
        let raw = match self.kv.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return History::new(),
            Err(e) => {
                warn!("failed to read history, starting empty: {e}");
                return History::new();
            }
        };

        match serde_json::from_str::<History>(&raw) {
            Ok(history) => {
                debug!(days = history.len(), "loaded history");
                history
            }
            Err(e) => {
                warn!("failed to parse history, resetting: {e}");
                History::new()
            }
        }
    }

    pub fn save(&self, history: &History) -> Result<(), StorageError> {
        let data = serde_json::to_string(history)?;
        self.kv.set(HISTORY_KEY, &data)
    }

    /// Fold one session into `history` under `date` and persist the result.
    ///
    /// Returns `Ok(false)` when `duration_seconds <= 0` and nothing changed.
    /// On a write failure the in-memory history keeps the new session.
    pub fn record_session(
        &self,
        history: &mut History,
        date: &str,
        duration_seconds: i64,
        created_at: i64,
    ) -> Result<bool, StorageError> {
        if duration_seconds <= 0 {
            return Ok(false);
        }
        *history = history.record_session(date, duration_seconds, created_at);
        self.save(history)?;
        Ok(true)
    }

    /// Drop every day record, in memory and on disk
    pub fn clear_all(&self, history: &mut History) -> Result<(), StorageError> {
        *history = History::new();
        self.save(history)
    }
}

/// Persists the label language under [`LANG_KEY`], independent of history
#[derive(Clone)]
pub struct LocaleStore {
    kv: Arc<dyn KeyValueStore>,
}

impl LocaleStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Stored locale, if one was saved and is recognised
    pub fn load(&self) -> Option<Locale> {
        match self.kv.get(LANG_KEY) {
            Ok(Some(raw)) => raw.trim().parse().ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("failed to read language preference: {e}");
                None
            }
        }
    }

    pub fn save(&self, locale: Locale) -> Result<(), StorageError> {
        self.kv.set(LANG_KEY, locale.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn memory() -> (Arc<MemoryKeyValueStore>, HistoryStore) {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let store = HistoryStore::new(kv.clone());
        (kv, store)
    }

    #[test]
    fn load_missing_is_empty() {
        let (_, store) = memory();
        assert!(store.load().is_empty());
    }

    #[test]
    fn load_malformed_is_empty() {
        let (kv, store) = memory();
        for bad in ["{not json", "[1,2,3]", "{\"2024-01-01\": {\"totalSeconds\": -4, \"sessions\": []}}", ""] {
            kv.insert_raw(HISTORY_KEY, bad);
            assert!(store.load().is_empty(), "expected empty history for {bad:?}");
        }
    }

    #[test]
    fn save_then_load_roundtrip() {
        let (_, store) = memory();
        let h = History::new()
            .record_session("2024-02-28", 120, 1)
            .record_session("2024-02-28", 30, 2)
            .record_session("2024-02-29", 3600, 3);
        store.save(&h).unwrap();
        assert_eq!(store.load(), h);
    }

    #[test]
    fn record_session_persists() {
        let (_, store) = memory();
        let mut h = History::new();
        assert!(store.record_session(&mut h, "2024-02-28", 5, 10).unwrap());
        assert_eq!(store.load(), h);
        assert_eq!(h.summary_for("2024-02-28"), (5, 1));
    }

    #[test]
    fn record_session_zero_is_noop() {
        let (kv, store) = memory();
        let mut h = History::new();
        assert!(!store.record_session(&mut h, "2024-02-28", 0, 10).unwrap());
        assert!(!store.record_session(&mut h, "2024-02-28", -5, 10).unwrap());
        assert!(h.is_empty());
        assert_eq!(kv.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn record_session_write_failure_keeps_memory() {
        let (kv, store) = memory();
        let mut h = History::new();
        kv.set_fail_writes(true);
        let result = store.record_session(&mut h, "2024-02-28", 42, 10);
        assert_matches!(result, Err(StorageError::Io { .. }));
        assert_eq!(h.summary_for("2024-02-28"), (42, 1));
    }

    #[test]
    fn clear_all_is_idempotent() {
        let (_, store) = memory();
        let mut h = History::new().record_session("2024-02-28", 9, 1);
        store.save(&h).unwrap();

        store.clear_all(&mut h).unwrap();
        assert!(h.is_empty());
        assert!(store.load().is_empty());

        store.clear_all(&mut h).unwrap();
        assert!(h.is_empty());
        assert!(store.load().is_empty());
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let kv = Arc::new(FileKeyValueStore::new(dir.path().join("state")));
        let store = HistoryStore::new(kv.clone());

        assert!(store.load().is_empty());

        let h = History::new().record_session("2023-11-05", 1500, 1_699_142_400_000);
        store.save(&h).unwrap();
        assert!(dir.path().join("state").join(HISTORY_KEY).exists());

        let reopened = HistoryStore::new(Arc::new(FileKeyValueStore::new(kv.dir())));
        assert_eq!(reopened.load(), h);
    }

    #[test]
    fn file_store_corrupt_file_is_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(HISTORY_KEY), b"\x00\x01garbage").unwrap();
        let store = HistoryStore::new(Arc::new(FileKeyValueStore::new(dir.path())));
        assert!(store.load().is_empty());
    }

    #[test]
    fn file_store_overwrites_previous_value() {
        let dir = tempdir().unwrap();
        let kv = FileKeyValueStore::new(dir.path());
        kv.set("k", "first").unwrap();
        kv.set("k", "second").unwrap();
        assert_eq!(kv.get("k").unwrap().as_deref(), Some("second"));
        assert!(!dir.path().join(".k.tmp").exists());
    }

    #[test]
    fn file_store_unwritable_dir_errors() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not a dir").unwrap();
        let kv = FileKeyValueStore::new(&blocker);
        assert_matches!(kv.set("k", "v"), Err(StorageError::Io { .. }));
    }

    #[test]
    fn locale_roundtrip_and_garbage() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let store = LocaleStore::new(kv.clone());
        assert_eq!(store.load(), None);

        store.save(Locale::En).unwrap();
        assert_eq!(kv.get(LANG_KEY).unwrap().as_deref(), Some("en"));
        assert_eq!(store.load(), Some(Locale::En));

        kv.insert_raw(LANG_KEY, "fr");
        assert_eq!(store.load(), None);
    }

    #[test]
    fn locale_and_history_are_independent() {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let history = HistoryStore::new(kv.clone());
        let locale = LocaleStore::new(kv.clone());

        locale.save(Locale::Ko).unwrap();
        let mut h = History::new().record_session("2024-01-01", 1, 1);
        history.clear_all(&mut h).unwrap();
        assert_eq!(locale.load(), Some(Locale::Ko));
    }
}
