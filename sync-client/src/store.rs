//! Local config store.
//!
//! Each device keeps its own copy of every setting. The store is injected
//! into the publisher, listener and observer instead of living in a global,
//! and has an explicit open/flush lifecycle.
//!
//! # Design
//!
//! - `get` returns the registry default for settings never written
//! - `set` checks the value type against the registry, then notifies every
//!   subscriber once, after the internal lock is released
//! - reads and writes are atomic per key; there is no cross-key transaction
//!
//! Two backends: [`MemoryStore`] for tests and the in-process loopback, and
//! [`FileStore`] which rewrites a JSON file before `set` returns.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use facesync_core::{keys, registry, BackgroundMode, RegistryError};
use facesync_types::{AssetHandle, SettingValue};
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unknown setting or wrong value type.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Failed to read the backing file.
    #[error("failed to read store file {path}: {source}")]
    Read {
        /// Path to the store file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The backing file is not a valid store document.
    #[error("failed to parse store file {path}: {source}")]
    Parse {
        /// Path to the store file.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Failed to write the backing file.
    #[error("failed to write store file {path}: {source}")]
    Write {
        /// Path to the store file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to encode the store document.
    #[error("failed to encode store: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Callback invoked with the logical name of a setting after it was written.
pub type StoreListener = Arc<dyn Fn(&str) + Send + Sync>;

/// Handle returned by [`ConfigStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Namespaced, typed key/value store for one device.
pub trait ConfigStore: Send + Sync {
    /// Read a setting, falling back to its registry default.
    fn get(&self, name: &str) -> Result<SettingValue, StoreError>;

    /// Write a setting and notify subscribers.
    fn set(&self, name: &str, value: SettingValue) -> Result<(), StoreError>;

    /// Register a change callback.
    fn subscribe(&self, listener: StoreListener) -> SubscriptionId;

    /// Remove a change callback. Returns whether it was registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Persist pending writes. Write-through and volatile stores have none.
    fn flush(&self) -> Result<(), StoreError>;

    /// Effective value of every registered setting.
    fn snapshot(&self) -> BTreeMap<String, SettingValue>;

    /// Read an `int32` setting.
    fn get_i32(&self, name: &str) -> Result<i32, StoreError> {
        let value = self.get(name)?;
        value.as_i32().ok_or_else(|| mismatch(name, &value))
    }

    /// Read an `int64` setting.
    fn get_i64(&self, name: &str) -> Result<i64, StoreError> {
        let value = self.get(name)?;
        value.as_i64().ok_or_else(|| mismatch(name, &value))
    }

    /// Read a `float32` setting.
    fn get_f32(&self, name: &str) -> Result<f32, StoreError> {
        let value = self.get(name)?;
        value.as_f32().ok_or_else(|| mismatch(name, &value))
    }

    /// Read a `bool` setting.
    fn get_bool(&self, name: &str) -> Result<bool, StoreError> {
        let value = self.get(name)?;
        value.as_bool().ok_or_else(|| mismatch(name, &value))
    }

    /// Read a `utf8` setting.
    fn get_string(&self, name: &str) -> Result<String, StoreError> {
        let value = self.get(name)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(name, &value))
    }

    /// Read an asset setting.
    fn get_asset(&self, name: &str) -> Result<AssetHandle, StoreError> {
        let value = self.get(name)?;
        value.as_asset().copied().ok_or_else(|| mismatch(name, &value))
    }

    /// Which background source is authoritative on this device.
    fn background_mode(&self) -> Result<BackgroundMode, StoreError> {
        Ok(BackgroundMode::from_code_or_default(
            self.get_i32(keys::BACKGROUND_TYPE)?,
        ))
    }

    /// When the background image was last replaced, in Unix milliseconds.
    fn asset_last_changed(&self) -> Result<i64, StoreError> {
        self.get_i64(keys::BACKGROUND_LAST_CHANGED)
    }
}

fn mismatch(name: &str, value: &SettingValue) -> StoreError {
    match registry().resolve(name) {
        Ok(setting) => StoreError::Registry(RegistryError::TypeMismatch {
            name: name.to_string(),
            expected: setting.value_type,
            actual: value.value_type(),
        }),
        Err(e) => e.into(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resolve `name` and check the value type. Returns the canonical name.
fn checked(name: &str, value: &SettingValue) -> Result<&'static str, StoreError> {
    let setting = registry().resolve(name)?;
    setting.check_type(value)?;
    Ok(setting.name)
}

/// Values plus subscribers, shared by both backends.
#[derive(Default)]
struct Entries {
    values: Mutex<HashMap<String, SettingValue>>,
    listeners: Mutex<Vec<(SubscriptionId, StoreListener)>>,
    next_id: AtomicU64,
}

impl Entries {
    fn with_values(values: HashMap<String, SettingValue>) -> Self {
        Self {
            values: Mutex::new(values),
            ..Self::default()
        }
    }

    fn get(&self, name: &str) -> Result<SettingValue, StoreError> {
        let setting = registry().resolve(name)?;
        Ok(lock(&self.values)
            .get(setting.name)
            .cloned()
            .unwrap_or_else(|| setting.default.clone()))
    }

    fn set(&self, name: &str, value: SettingValue) -> Result<(), StoreError> {
        let name = checked(name, &value)?;
        lock(&self.values).insert(name.to_string(), value);
        self.notify(name);
        Ok(())
    }

    fn notify(&self, name: &str) {
        let listeners: Vec<StoreListener> = lock(&self.listeners)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(name);
        }
    }

    fn subscribe(&self, listener: StoreListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn snapshot(&self) -> BTreeMap<String, SettingValue> {
        let values = lock(&self.values);
        registry()
            .settings()
            .iter()
            .map(|s| {
                let value = values.get(s.name).cloned().unwrap_or_else(|| s.default.clone());
                (s.name.to_string(), value)
            })
            .collect()
    }

    fn stored(&self) -> BTreeMap<String, SettingValue> {
        lock(&self.values)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Volatile in-memory store.
///
/// Clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Entries>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of settings explicitly written.
    pub fn len(&self) -> usize {
        lock(&self.entries.values).len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConfigStore for MemoryStore {
    fn get(&self, name: &str) -> Result<SettingValue, StoreError> {
        self.entries.get(name)
    }

    fn set(&self, name: &str, value: SettingValue) -> Result<(), StoreError> {
        self.entries.set(name, value)
    }

    fn subscribe(&self, listener: StoreListener) -> SubscriptionId {
        self.entries.subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.entries.unsubscribe(id)
    }

    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn snapshot(&self) -> BTreeMap<String, SettingValue> {
        self.entries.snapshot()
    }
}

/// Store persisted as a JSON document.
///
/// Every `set` replaces the file atomically (temp file, fsync, rename)
/// before it returns; a failed write leaves the previous value in place.
/// Clones share state.
#[derive(Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: Arc<Entries>,
    writer: Arc<Mutex<()>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file yields an empty store.
    ///
    /// Entries for unknown settings or with a stale type are dropped.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => parse_document(&path, &content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError::Read { path, source: e }),
        };

        tracing::debug!("Opened store {} ({} entries)", path.display(), values.len());
        Ok(Self {
            path,
            entries: Arc::new(Entries::with_values(values)),
            writer: Arc::new(Mutex::new(())),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse_document(path: &Path, content: &str) -> Result<HashMap<String, SettingValue>, StoreError> {
    let document: BTreeMap<String, SettingValue> =
        serde_json::from_str(content).map_err(|e| StoreError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut values = HashMap::with_capacity(document.len());
    for (name, value) in document {
        match registry().resolve(&name).and_then(|s| s.check_type(&value)) {
            Ok(()) => {
                values.insert(name, value);
            }
            Err(e) => tracing::warn!("Dropping stored entry {}: {}", name, e),
        }
    }
    Ok(values)
}

impl ConfigStore for FileStore {
    fn get(&self, name: &str) -> Result<SettingValue, StoreError> {
        self.entries.get(name)
    }

    fn set(&self, name: &str, value: SettingValue) -> Result<(), StoreError> {
        let name = checked(name, &value)?;
        {
            let _writer = lock(&self.writer);
            let mut document = self.entries.stored();
            document.insert(name.to_string(), value.clone());
            write_document(&self.path, &document)?;
            lock(&self.entries.values).insert(name.to_string(), value);
        }
        self.entries.notify(name);
        Ok(())
    }

    fn subscribe(&self, listener: StoreListener) -> SubscriptionId {
        self.entries.subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.entries.unsubscribe(id)
    }

    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn snapshot(&self) -> BTreeMap<String, SettingValue> {
        self.entries.snapshot()
    }
}

fn write_document(path: &Path, document: &BTreeMap<String, SettingValue>) -> Result<(), StoreError> {
    use std::io::Write;

    let bytes = serde_json::to_vec_pretty(document).map_err(StoreError::Encode)?;
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let tmp = path.with_extension("json.tmp");
    let mut file = std::fs::File::create(&tmp).map_err(write_err)?;
    file.write_all(&bytes).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);
    std::fs::rename(&tmp, path).map_err(write_err)?;

    tracing::trace!("Wrote {} entries to {}", document.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use facesync_core::{face::color, keys};
    use std::sync::atomic::AtomicUsize;

    fn counting_listener(store: &dyn ConfigStore) -> (Arc<Mutex<Vec<String>>>, SubscriptionId) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = store.subscribe(Arc::new(move |name: &str| {
            sink.lock().unwrap().push(name.to_string());
        }));
        (seen, id)
    }

    // ===========================================
    // MemoryStore Tests
    // ===========================================

    #[test]
    fn unset_setting_returns_default() {
        let store = MemoryStore::new();
        assert_eq!(store.get_i32(keys::BACKGROUND_COLOR).unwrap(), color::HOLO_BLUE_DARK);
        assert_eq!(store.get_f32(keys::TEXT_SIZE).unwrap(), 30.0);
        assert_eq!(store.get_i64(keys::BACKGROUND_LAST_CHANGED).unwrap(), 0);
        assert!(store.get_asset(keys::BACKGROUND_ASSET).unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn set_then_get() {
        let store = MemoryStore::new();
        store.set(keys::TEXT_COLOR, SettingValue::Int32(0x00FF_FFFF)).unwrap();
        store.set(keys::TEXT_FONT, "lobster-two".into()).unwrap();

        assert_eq!(store.get_i32(keys::TEXT_COLOR).unwrap(), 0x00FF_FFFF);
        assert_eq!(store.get_string(keys::TEXT_FONT).unwrap(), "lobster-two");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn set_overwrites() {
        let store = MemoryStore::new();
        store.set(keys::TEXT_SHADOW, false.into()).unwrap();
        store.set(keys::TEXT_SHADOW, true.into()).unwrap();

        assert!(store.get_bool(keys::TEXT_SHADOW).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn set_rejects_wrong_type() {
        let store = MemoryStore::new();
        let result = store.set(keys::TEXT_SIZE, SettingValue::Int32(30));

        assert!(matches!(
            result,
            Err(StoreError::Registry(RegistryError::TypeMismatch { .. }))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_setting_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get("wallpaper_blur"),
            Err(StoreError::Registry(RegistryError::UnknownSetting(_)))
        ));
        assert!(store.set("wallpaper_blur", true.into()).is_err());
    }

    #[test]
    fn typed_getter_reports_mismatch() {
        let store = MemoryStore::new();
        let result = store.get_bool(keys::TEXT_COLOR);
        assert!(matches!(
            result,
            Err(StoreError::Registry(RegistryError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn snapshot_covers_every_setting() {
        let store = MemoryStore::new();
        store.set(keys::TEXT_CASE, SettingValue::Int32(2)).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), registry().settings().len());
        assert_eq!(snapshot[keys::TEXT_CASE], SettingValue::Int32(2));
        assert_eq!(snapshot[keys::TEXT_SHADOW], SettingValue::Bool(true));
    }

    // ===========================================
    // Subscription Tests
    // ===========================================

    #[test]
    fn subscribers_notified_once_per_set() {
        let store = MemoryStore::new();
        let (seen, _) = counting_listener(&store);

        store.set(keys::TEXT_COLOR, SettingValue::Int32(1)).unwrap();
        store.set(keys::TEXT_SIZE, 20.0f32.into()).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["text_color", "text_size"]);
    }

    #[test]
    fn rejected_set_does_not_notify() {
        let store = MemoryStore::new();
        let (seen, _) = counting_listener(&store);

        let _ = store.set(keys::TEXT_SIZE, true.into());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = MemoryStore::new();
        let (seen, id) = counting_listener(&store);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set(keys::TEXT_COLOR, SettingValue::Int32(1)).unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn listener_may_read_store() {
        let store = MemoryStore::new();
        let reader = store.clone();
        let reads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reads);
        store.subscribe(Arc::new(move |name: &str| {
            reader.get(name).unwrap();
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        store.set(keys::TEXT_COLOR, SettingValue::Int32(1)).unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    // ===========================================
    // FileStore Tests
    // ===========================================

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("renderer.json")).unwrap();

        assert_eq!(store.get_i32(keys::TEXT_COLOR).unwrap(), color::WHITE);
        assert!(!dir.path().join("renderer.json").exists());
    }

    #[test]
    fn file_store_set_is_durable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");

        let store = FileStore::open(&path).unwrap();
        store.set(keys::TEXT_POSITION, SettingValue::Int32(8)).unwrap();
        store.set(keys::BACKGROUND_LAST_CHANGED, 1_700_000_000_000i64.into()).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_i32(keys::TEXT_POSITION).unwrap(), 8);
        assert_eq!(
            reopened.get_i64(keys::BACKGROUND_LAST_CHANGED).unwrap(),
            1_700_000_000_000
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn file_store_drops_stale_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renderer.json");
        std::fs::write(
            &path,
            r#"{
                "text_color": {"type": "int32", "value": 16777215},
                "text_size": {"type": "bool", "value": true},
                "legacy_seconds": {"type": "bool", "value": true}
            }"#,
        )
        .unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get_i32(keys::TEXT_COLOR).unwrap(), 0x00FF_FFFF);
        assert_eq!(store.get_f32(keys::TEXT_SIZE).unwrap(), 30.0);
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renderer.json");
        std::fs::write(&path, "not json").unwrap();

        let result = FileStore::open(&path);
        assert!(matches!(result, Err(StoreError::Parse { .. })));
    }

    #[test]
    fn flush_without_writes_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renderer.json");

        let store = FileStore::open(&path).unwrap();
        store.flush().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("renderer.json");
        std::fs::create_dir(&path).unwrap();

        let broken = FileStore {
            path,
            entries: Arc::new(Entries::default()),
            writer: Arc::new(Mutex::new(())),
        };
        let (seen, _) = counting_listener(&broken);
        let result = broken.set(keys::TEXT_CASE, SettingValue::Int32(2));

        assert!(matches!(result, Err(StoreError::Write { .. })));
        assert_eq!(broken.get_i32(keys::TEXT_CASE).unwrap(), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn typed_background_helpers() {
        let store = MemoryStore::new();
        assert_eq!(store.background_mode().unwrap(), BackgroundMode::Color);
        assert_eq!(store.asset_last_changed().unwrap(), 0);

        store
            .set(keys::BACKGROUND_TYPE, SettingValue::Int32(BackgroundMode::Image.code()))
            .unwrap();
        store
            .set(keys::BACKGROUND_LAST_CHANGED, SettingValue::Int64(42))
            .unwrap();
        assert_eq!(store.background_mode().unwrap(), BackgroundMode::Image);
        assert_eq!(store.asset_last_changed().unwrap(), 42);
    }
}
