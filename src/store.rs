//! JSON record store
//!
//! One collection per file under a data directory, whole-document replace on
//! every write. Writers go through a per-collection mutex and an atomic
//! temp-file-plus-rename, so a reader never observes a half-written document.
//! A missing file is an empty collection; a corrupt file is quarantined and
//! reported as recovered-empty rather than silently discarded.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, ValetError};

/// Where a loaded collection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Deserialized from the backing file
    File,
    /// Backing file did not exist
    Missing,
    /// Backing file was unreadable or malformed; it was renamed aside to
    /// `<name>.json.corrupt` and the collection starts fresh. Data loss
    /// occurred and callers can tell.
    CorruptRecovered,
}

/// A collection together with its provenance
#[derive(Debug)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub origin: LoadOrigin,
}

/// File-backed store for named JSON collections
pub struct RecordStore {
    data_dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    ids_lock: Mutex<()>,
}

/// Sidecar file holding the monotonic id counters (last id handed out per
/// collection), so ids are never reused after deletion.
const IDS_FILE: &str = "ids";

impl RecordStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self {
            data_dir,
            locks: Mutex::new(HashMap::new()),
            ids_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The writer mutex for one collection. Repositories hold it across their
    /// load-mutate-save cycle.
    pub fn collection_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock();
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{name}.json"))
    }

    /// Read the raw document, distinguishing missing from unreadable.
    fn read_raw(&self, name: &str) -> (Option<String>, LoadOrigin) {
        let path = self.path_for(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => (Some(text), LoadOrigin::File),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (None, LoadOrigin::Missing),
            Err(e) => {
                tracing::warn!(collection = name, error = %e, "unreadable collection file");
                self.quarantine(name);
                (None, LoadOrigin::CorruptRecovered)
            }
        }
    }

    /// Move a bad file aside so the evidence survives the fresh start.
    fn quarantine(&self, name: &str) {
        let path = self.path_for(name);
        let aside = self.data_dir.join(format!("{name}.json.corrupt"));
        if let Err(e) = std::fs::rename(&path, &aside) {
            tracing::warn!(collection = name, error = %e, "failed to quarantine corrupt file");
        } else {
            tracing::warn!(
                collection = name,
                quarantined = %aside.display(),
                "corrupt collection quarantined; starting fresh"
            );
        }
    }

    /// Load a collection as a vector of records.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Loaded<T>> {
        let (text, origin) = self.read_raw(name);
        let Some(text) = text else {
            return Ok(Loaded {
                records: Vec::new(),
                origin,
            });
        };
        match serde_json::from_str(&text) {
            Ok(records) => Ok(Loaded {
                records,
                origin: LoadOrigin::File,
            }),
            Err(e) => {
                tracing::warn!(collection = name, error = %e, "malformed collection file");
                self.quarantine(name);
                Ok(Loaded {
                    records: Vec::new(),
                    origin: LoadOrigin::CorruptRecovered,
                })
            }
        }
    }

    /// Replace a collection on disk.
    pub fn save<T: Serialize>(&self, name: &str, records: &[T]) -> Result<()> {
        self.write_document(name, records)
    }

    /// Load a keyed document (conversation history), same recovery policy.
    pub fn load_map<V: DeserializeOwned>(&self, name: &str) -> Result<BTreeMap<String, V>> {
        let (text, _origin) = self.read_raw(name);
        let Some(text) = text else {
            return Ok(BTreeMap::new());
        };
        match serde_json::from_str(&text) {
            Ok(map) => Ok(map),
            Err(e) => {
                tracing::warn!(collection = name, error = %e, "malformed document file");
                self.quarantine(name);
                Ok(BTreeMap::new())
            }
        }
    }

    /// Replace a keyed document on disk.
    pub fn save_map<V: Serialize>(&self, name: &str, map: &BTreeMap<String, V>) -> Result<()> {
        self.write_document(name, map)
    }

    /// Allocate the next id for a collection.
    ///
    /// The counter persists in a sidecar document and is reconciled against
    /// the loaded collection (`max(counter, max_id)`), so ids stay monotonic
    /// even if the sidecar is lost and are never reused after deletion.
    pub fn next_id(&self, name: &str, current_max_id: i64) -> Result<i64> {
        let _guard = self.ids_lock.lock();
        let mut counters: BTreeMap<String, i64> = {
            let (text, _origin) = self.read_raw(IDS_FILE);
            text.and_then(|t| serde_json::from_str(&t).ok())
                .unwrap_or_default()
        };
        let last = counters.get(name).copied().unwrap_or(0).max(current_max_id);
        let id = last + 1;
        counters.insert(name.to_string(), id);
        self.write_document(IDS_FILE, &counters)?;
        Ok(id)
    }

    /// Pretty-print to a temp file in the same directory, then rename over
    /// the target. Whole-document replace, atomic from a reader's view.
    fn write_document<D: Serialize + ?Sized>(&self, name: &str, doc: &D) -> Result<()> {
        let path = self.path_for(name);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.data_dir)?;
        serde_json::to_writer_pretty(&mut tmp, doc)?;
        tmp.flush()?;
        tmp.persist(&path)
            .map_err(|e| ValetError::Storage(format!("replacing {}: {}", path.display(), e.error)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Rec {
        id: i64,
        label: String,
    }

    fn rec(id: i64, label: &str) -> Rec {
        Rec {
            id,
            label: label.to_string(),
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        let loaded: Loaded<Rec> = store.load("todos").unwrap();
        assert!(loaded.records.is_empty());
        assert_eq!(loaded.origin, LoadOrigin::Missing);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        let records = vec![rec(1, "alpha"), rec(2, "beta")];
        store.save("todos", &records).unwrap();
        let loaded: Loaded<Rec> = store.load("todos").unwrap();
        assert_eq!(loaded.records, records);
        assert_eq!(loaded.origin, LoadOrigin::File);
    }

    #[test]
    fn corrupt_file_is_quarantined_and_reported() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("todos.json"), "{not json").unwrap();

        let loaded: Loaded<Rec> = store.load("todos").unwrap();
        assert!(loaded.records.is_empty());
        assert_eq!(loaded.origin, LoadOrigin::CorruptRecovered);
        assert!(dir.path().join("todos.json.corrupt").exists());
        assert!(!dir.path().join("todos.json").exists());
    }

    #[test]
    fn next_id_is_monotonic_across_deletion() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        assert_eq!(store.next_id("notes", 0).unwrap(), 1);
        assert_eq!(store.next_id("notes", 1).unwrap(), 2);
        // Everything deleted: counter still refuses to reuse ids
        assert_eq!(store.next_id("notes", 0).unwrap(), 3);
    }

    #[test]
    fn next_id_reconciles_against_existing_records() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        // Counter sidecar lost, collection says max id is 7
        assert_eq!(store.next_id("events", 7).unwrap(), 8);
    }

    #[test]
    fn counters_are_per_collection() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        assert_eq!(store.next_id("todos", 0).unwrap(), 1);
        assert_eq!(store.next_id("contacts", 0).unwrap(), 1);
        assert_eq!(store.next_id("todos", 1).unwrap(), 2);
    }

    #[test]
    fn map_document_round_trips() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(dir.path()).unwrap();
        let mut map: BTreeMap<String, Vec<Rec>> = BTreeMap::new();
        map.insert("session-1".into(), vec![rec(1, "hi")]);
        store.save_map("conversations", &map).unwrap();
        let loaded: BTreeMap<String, Vec<Rec>> = store.load_map("conversations").unwrap();
        assert_eq!(loaded, map);
    }
}
