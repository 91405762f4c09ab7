//! Bounded history list persisted through a [`Storage`] port.

use super::entry::HistoryEntry;
use super::storage::Storage;
use tracing::{debug, warn};

/// Maximum number of entries kept.
pub const MAX_ENTRIES: usize = 30;

/// The single slot the history lives under.
pub const HISTORY_KEY: &str = "novacalc_history_v2";

/// Bounded, most-recent-first list of past calculations.
///
/// Every mutation is written through to the storage port. Persistence
/// failures are logged and swallowed; the in-memory list stays
/// authoritative for the rest of the session.
#[derive(Debug)]
pub struct HistoryStore<S: Storage> {
    entries: Vec<HistoryEntry>,
    storage: S,
}

impl<S: Storage> HistoryStore<S> {
    /// Load persisted history, or start empty if it is absent or unreadable.
    pub fn load(storage: S) -> Self {
        let entries = match storage.read(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
                Ok(mut entries) => {
                    entries.truncate(MAX_ENTRIES);
                    entries
                }
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable history");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read history");
                Vec::new()
            }
        };

        debug!(count = entries.len(), "Loaded history");
        Self { entries, storage }
    }

    /// Entries, most recent first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Create and prepend an entry for a successful evaluation.
    ///
    /// The timestamp never goes backwards relative to the newest entry,
    /// even if the wall clock does.
    pub fn record(&mut self, expression: &str, result: &str) -> &HistoryEntry {
        let now = chrono::Utc::now().timestamp_millis();
        let timestamp = self
            .entries
            .first()
            .map_or(now, |newest| now.max(newest.timestamp()));

        self.append(HistoryEntry::new(expression, result, timestamp));
        &self.entries[0]
    }

    /// Prepend an entry, evicting the oldest ones beyond capacity.
    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        if self.entries.len() > MAX_ENTRIES {
            let evicted = self.entries.len() - MAX_ENTRIES;
            self.entries.truncate(MAX_ENTRIES);
            debug!(evicted, "History at capacity");
        }
        self.save();
    }

    /// Empty the list and drop the persisted copy.
    pub fn clear(&mut self) {
        self.entries.clear();
        if let Err(e) = self.storage.remove(HISTORY_KEY) {
            warn!(error = %e, "Failed to remove persisted history");
        }
    }

    /// Persist the full list.
    pub fn save(&self) {
        let json = match serde_json::to_string(&self.entries) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize history");
                return;
            }
        };
        if let Err(e) = self.storage.write(HISTORY_KEY, &json) {
            warn!(error = %e, "Failed to persist history");
        }
    }

    /// Hand the storage back, e.g. to reload it as if after a restart.
    pub fn into_storage(self) -> S {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::storage::{MemoryStorage, StorageError};
    use std::io;
    use std::path::PathBuf;

    /// Storage whose every operation fails.
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Read {
                path: PathBuf::from("broken"),
                source: io::Error::other("disk gone"),
            })
        }

        fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write {
                path: PathBuf::from("broken"),
                source: io::Error::other("disk gone"),
            })
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Remove {
                path: PathBuf::from("broken"),
                source: io::Error::other("disk gone"),
            })
        }
    }

    #[test]
    fn test_most_recent_first() {
        let mut store = HistoryStore::load(MemoryStorage::new());
        store.record("1+1", "2");
        store.record("2+2", "4");
        assert_eq!(store.entries()[0].expression(), "2+2");
        assert_eq!(store.entries()[1].expression(), "1+1");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = HistoryStore::load(MemoryStorage::new());
        for i in 0..(MAX_ENTRIES + 5) {
            store.record(&format!("{i}+0"), &i.to_string());
            assert!(store.len() <= MAX_ENTRIES);
        }
        assert_eq!(store.len(), MAX_ENTRIES);
        assert_eq!(store.entries()[0].expression(), "34+0");
        assert_eq!(store.entries()[MAX_ENTRIES - 1].expression(), "5+0");
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let mut store = HistoryStore::load(MemoryStorage::new());
        store.append(HistoryEntry::new("far future", "1", i64::MAX / 2));
        let recorded = store.record("now", "2").timestamp();
        assert_eq!(recorded, i64::MAX / 2);
    }

    #[test]
    fn test_persists_across_reload() {
        let storage = MemoryStorage::new();
        let mut store = HistoryStore::load(storage.clone());
        let id = store.record("3×3", "9").id().to_string();

        let reloaded = HistoryStore::load(storage);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(&id).map(HistoryEntry::result), Some("9"));
    }

    #[test]
    fn test_clear_removes_persisted_copy() {
        let storage = MemoryStorage::new();
        let mut store = HistoryStore::load(storage.clone());
        store.record("1+1", "2");
        store.clear();
        assert!(store.is_empty());
        assert_eq!(storage.read(HISTORY_KEY).unwrap(), None);

        let reloaded = HistoryStore::load(store.into_storage());
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_corrupt_history_loads_empty() {
        let storage = MemoryStorage::new();
        storage.write(HISTORY_KEY, "{not json").unwrap();
        assert!(HistoryStore::load(storage.clone()).is_empty());

        storage
            .write(HISTORY_KEY, r#"[{"id":"a","expression":"1"}]"#)
            .unwrap();
        assert!(HistoryStore::load(storage).is_empty());
    }

    #[test]
    fn test_oversized_history_is_truncated_on_load() {
        let entries: Vec<HistoryEntry> = (0..40)
            .map(|i| HistoryEntry::new(i.to_string(), i.to_string(), i))
            .collect();
        let storage = MemoryStorage::new();
        storage
            .write(HISTORY_KEY, &serde_json::to_string(&entries).unwrap())
            .unwrap();
        assert_eq!(HistoryStore::load(storage).len(), MAX_ENTRIES);
    }

    #[test]
    fn test_storage_failures_are_absorbed() {
        let mut store = HistoryStore::load(BrokenStorage);
        assert!(store.is_empty());
        store.record("1+2", "3");
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_unknown_id() {
        let mut store = HistoryStore::load(MemoryStorage::new());
        store.record("1+1", "2");
        assert!(store.get("missing").is_none());
    }
}
