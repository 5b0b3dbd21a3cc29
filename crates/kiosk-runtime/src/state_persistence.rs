//! Durable key-value store for the kiosk's saved form.
//!
//! [`StateRegistry`] keeps an in-memory copy of every record and writes the
//! whole set through a [`StorageBackend`] when flushed. The form controller
//! sets a record on every edit (cheap, memory only) and flushes on a
//! debounce timer and on shutdown.
//!
//! ```text
//!   set/remove ──► StateRegistry (cache + dirty flag) ──flush──► StorageBackend
//!                                                                ├─ MemoryStorage
//!                                                                └─ FileStorage (state-persistence)
//! ```
//!
//! Storage failures are returned as [`StorageError`] and never panic. The
//! caller decides whether a failure matters; the kiosk logs it and carries on
//! with defaults.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

// --- Errors ----------------------------------------------------------------

/// Errors from the durable store.
#[derive(Debug)]
pub enum StorageError {
    /// File I/O failed.
    Io(std::io::Error),
    /// A record or the store file could not be encoded or decoded.
    Serialization(String),
    /// Stored data is malformed, or an internal lock was poisoned.
    Corruption(String),
    /// The backend cannot be used in this environment.
    Unavailable(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Serialization(msg) => write!(f, "serialization error: {msg}"),
            Self::Corruption(msg) => write!(f, "storage corruption: {msg}"),
            Self::Unavailable(msg) => write!(f, "storage unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// --- Backends --------------------------------------------------------------

/// One stored value: an opaque payload tagged with the schema version of
/// whoever wrote it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredEntry {
    pub key: String,
    pub schema_version: u32,
    pub payload: Vec<u8>,
}

impl StoredEntry {
    pub fn new(key: impl Into<String>, schema_version: u32, payload: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            schema_version,
            payload,
        }
    }
}

/// Where records live between runs.
///
/// `save_all` replaces the whole stored set; it does not merge.
pub trait StorageBackend: Send + Sync {
    /// Name for logs.
    fn name(&self) -> &str;

    /// Every stored record. Empty on first run.
    fn load_all(&self) -> StorageResult<HashMap<String, StoredEntry>>;

    /// Replace the stored set with `entries`.
    fn save_all(&self, entries: &HashMap<String, StoredEntry>) -> StorageResult<()>;

    /// Remove everything.
    fn clear(&self) -> StorageResult<()>;

    fn is_available(&self) -> bool {
        true
    }
}

fn poisoned(what: &str) -> StorageError {
    StorageError::Corruption(format!("{what} lock poisoned"))
}

/// Process-local backend. Counts writes so tests can check debouncing.
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    entries: HashMap<String, StoredEntry>,
    writes: usize,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds `entries`, as if left by a previous run.
    #[must_use]
    pub fn with_entries(entries: impl IntoIterator<Item = StoredEntry>) -> Self {
        let entries = entries.into_iter().map(|e| (e.key.clone(), e)).collect();
        Self {
            inner: Mutex::new(MemoryInner { entries, writes: 0 }),
        }
    }

    /// Number of successful `save_all` calls.
    pub fn write_count(&self) -> usize {
        self.inner.lock().map(|g| g.writes).unwrap_or(0)
    }

    /// Copy of a stored record.
    pub fn entry(&self, key: &str) -> Option<StoredEntry> {
        self.inner.lock().ok()?.entries.get(key).cloned()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, MemoryInner>> {
        self.inner.lock().map_err(|_| poisoned("memory storage"))
    }
}

impl StorageBackend for MemoryStorage {
    fn name(&self) -> &str {
        "MemoryStorage"
    }

    fn load_all(&self) -> StorageResult<HashMap<String, StoredEntry>> {
        Ok(self.lock()?.entries.clone())
    }

    fn save_all(&self, entries: &HashMap<String, StoredEntry>) -> StorageResult<()> {
        let mut inner = self.lock()?;
        inner.entries = entries.clone();
        inner.writes += 1;
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.lock()?.entries.clear();
        Ok(())
    }
}

impl fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (entries, writes) = self
            .inner
            .lock()
            .map(|g| (g.entries.len(), g.writes))
            .unwrap_or((0, 0));
        f.debug_struct("MemoryStorage")
            .field("entries", &entries)
            .field("writes", &writes)
            .finish()
    }
}

/// Shared handles delegate, so a test can keep an `Arc` to inspect the
/// backend it gave the registry.
impl<B: StorageBackend + ?Sized> StorageBackend for Arc<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load_all(&self) -> StorageResult<HashMap<String, StoredEntry>> {
        (**self).load_all()
    }

    fn save_all(&self, entries: &HashMap<String, StoredEntry>) -> StorageResult<()> {
        (**self).save_all(entries)
    }

    fn clear(&self) -> StorageResult<()> {
        (**self).clear()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

#[cfg(feature = "state-persistence")]
mod file_storage {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as B64;
    use serde::{Deserialize, Serialize};
    use std::fs::{self, File};
    use std::io::{BufReader, BufWriter, Write};
    use std::path::{Path, PathBuf};

    const FORMAT_VERSION: u32 = 1;

    #[derive(Serialize, Deserialize)]
    struct StoreFile {
        format_version: u32,
        records: HashMap<String, FileRecord>,
    }

    #[derive(Serialize, Deserialize)]
    struct FileRecord {
        schema_version: u32,
        payload_base64: String,
    }

    /// JSON file backend.
    ///
    /// ```json
    /// {
    ///   "format_version": 1,
    ///   "records": {
    ///     "kiosk-form-v2": { "schema_version": 2, "payload_base64": "eyJsYW5n..." }
    ///   }
    /// }
    /// ```
    ///
    /// Saves go to `<path>.tmp`, are synced, then renamed over `<path>`, so a
    /// crash mid-write leaves the previous file intact.
    pub struct FileStorage {
        path: PathBuf,
    }

    impl FileStorage {
        /// The file is created on first save.
        #[must_use]
        pub fn new(path: impl AsRef<Path>) -> Self {
            Self {
                path: path.as_ref().to_path_buf(),
            }
        }

        /// `$XDG_STATE_HOME/<app>/state.json`, falling back to
        /// `~/.local/state` and then the working directory.
        #[must_use]
        pub fn default_for_app(app_name: &str) -> Self {
            Self::new(state_dir().join(app_name).join("state.json"))
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn temp_path(&self) -> PathBuf {
            let mut tmp = self.path.clone().into_os_string();
            tmp.push(".tmp");
            PathBuf::from(tmp)
        }
    }

    fn state_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os("XDG_STATE_HOME").filter(|v| !v.is_empty()) {
            return PathBuf::from(dir);
        }
        match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".local").join("state"),
            None => PathBuf::from("."),
        }
    }

    impl StorageBackend for FileStorage {
        fn name(&self) -> &str {
            "FileStorage"
        }

        fn load_all(&self) -> StorageResult<HashMap<String, StoredEntry>> {
            if !self.path.exists() {
                return Ok(HashMap::new());
            }
            let reader = BufReader::new(File::open(&self.path)?);
            let file: StoreFile = serde_json::from_reader(reader)
                .map_err(|e| StorageError::Serialization(format!("unreadable store file: {e}")))?;

            if file.format_version != FORMAT_VERSION {
                tracing::warn!(
                    target: "kiosk::storage",
                    found = file.format_version,
                    expected = FORMAT_VERSION,
                    "store file format mismatch, starting empty"
                );
                return Ok(HashMap::new());
            }

            let mut out = HashMap::with_capacity(file.records.len());
            for (key, record) in file.records {
                match B64.decode(record.payload_base64.as_bytes()) {
                    Ok(payload) => {
                        out.insert(
                            key.clone(),
                            StoredEntry::new(key, record.schema_version, payload),
                        );
                    }
                    Err(e) => {
                        tracing::warn!(target: "kiosk::storage", %key, error = %e, "skipping undecodable record");
                    }
                }
            }
            Ok(out)
        }

        fn save_all(&self, entries: &HashMap<String, StoredEntry>) -> StorageResult<()> {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }

            let file = StoreFile {
                format_version: FORMAT_VERSION,
                records: entries
                    .iter()
                    .map(|(key, e)| {
                        let record = FileRecord {
                            schema_version: e.schema_version,
                            payload_base64: B64.encode(&e.payload),
                        };
                        (key.clone(), record)
                    })
                    .collect(),
            };

            let tmp = self.temp_path();
            {
                let mut writer = BufWriter::new(File::create(&tmp)?);
                serde_json::to_writer_pretty(&mut writer, &file)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                writer.flush()?;
                writer.get_ref().sync_all()?;
            }
            fs::rename(&tmp, &self.path)?;

            tracing::debug!(
                target: "kiosk::storage",
                path = %self.path.display(),
                records = entries.len(),
                "store file written"
            );
            Ok(())
        }

        fn clear(&self) -> StorageResult<()> {
            match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        }

        fn is_available(&self) -> bool {
            let Some(dir) = self.path.parent() else {
                return false;
            };
            let dir = if dir.as_os_str().is_empty() {
                Path::new(".")
            } else {
                dir
            };
            if fs::create_dir_all(dir).is_err() {
                return false;
            }
            let probe = dir.join(".kiosk_write_probe");
            let ok = fs::write(&probe, b"ok").is_ok();
            let _ = fs::remove_file(&probe);
            ok
        }
    }

    impl fmt::Debug for FileStorage {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FileStorage")
                .field("path", &self.path)
                .finish()
        }
    }
}

#[cfg(feature = "state-persistence")]
pub use file_storage::FileStorage;

// --- Registry --------------------------------------------------------------

#[derive(Default)]
struct Cache {
    entries: HashMap<String, StoredEntry>,
    dirty: bool,
}

/// Write-back cache in front of a [`StorageBackend`].
///
/// `Send + Sync`; wrap in an `Arc` with [`shared`](Self::shared) to hand the
/// same registry to the program loop and the model.
pub struct StateRegistry {
    backend: Box<dyn StorageBackend>,
    cache: Mutex<Cache>,
}

impl StateRegistry {
    /// Starts empty; call [`load`](Self::load) to read the backend.
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self {
            backend,
            cache: Mutex::new(Cache::default()),
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    #[cfg(feature = "state-persistence")]
    #[must_use]
    pub fn with_file(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(Box::new(FileStorage::new(path)))
    }

    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn cache(&self) -> StorageResult<MutexGuard<'_, Cache>> {
        self.cache.lock().map_err(|_| poisoned("registry cache"))
    }

    /// Replace the cache with the backend's contents. Returns the record count.
    pub fn load(&self) -> StorageResult<usize> {
        let entries = self.backend.load_all()?;
        let count = entries.len();
        let mut cache = self.cache()?;
        cache.entries = entries;
        cache.dirty = false;
        tracing::debug!(target: "kiosk::storage", backend = self.backend.name(), count, "store loaded");
        Ok(count)
    }

    /// Write the cache to the backend if anything changed since the last
    /// flush. Returns whether a write happened.
    pub fn flush(&self) -> StorageResult<bool> {
        let mut cache = self.cache()?;
        if !cache.dirty {
            return Ok(false);
        }
        self.backend.save_all(&cache.entries)?;
        cache.dirty = false;
        Ok(true)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<StoredEntry> {
        self.cache().ok()?.entries.get(key).cloned()
    }

    /// Update a record in memory and mark the registry dirty. Setting an
    /// identical record is not a change.
    pub fn set(&self, key: impl Into<String>, schema_version: u32, payload: Vec<u8>) {
        let entry = StoredEntry::new(key, schema_version, payload);
        if let Ok(mut cache) = self.cache() {
            if cache.entries.get(&entry.key) == Some(&entry) {
                return;
            }
            cache.entries.insert(entry.key.clone(), entry);
            cache.dirty = true;
        }
    }

    /// Drop a record from memory. Takes effect in the backend on the next
    /// flush.
    pub fn remove(&self, key: &str) -> Option<StoredEntry> {
        let mut cache = self.cache().ok()?;
        let removed = cache.entries.remove(key);
        if removed.is_some() {
            cache.dirty = true;
        }
        removed
    }

    /// Empty both the cache and the backend.
    pub fn clear(&self) -> StorageResult<()> {
        self.backend.clear()?;
        let mut cache = self.cache()?;
        cache.entries.clear();
        cache.dirty = false;
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache().map(|c| c.entries.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.cache().map(|c| c.dirty).unwrap_or(false)
    }

    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }
}

impl fmt::Debug for StateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateRegistry")
            .field("backend", &self.backend.name())
            .field("entries", &self.len())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}
