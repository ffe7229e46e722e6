//! Durable key/value stores backing the gallery.
//!
//! One keyed record holds the whole gallery as a JSON string. Native builds
//! write a file per key under the platform data directory; the web build uses
//! `window.localStorage`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage is unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read record: {0}")]
    Read(String),

    #[error("Failed to write record: {0}")]
    Write(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait DurableStore: Send {
    fn load(&self, key: &str) -> StoreResult<Option<String>>;
    fn store(&mut self, key: &str, value: &str) -> StoreResult<()>;
}

/// Session-only store. Clones share the same records, so a test can keep a
/// handle while the gallery owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.records.lock().insert(key.to_owned(), value.to_owned());
        store
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.records.lock().get(key).cloned()
    }
}

impl DurableStore for MemoryStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.get(key))
    }

    fn store(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.records.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// One JSON file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform's local data directory.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn in_project_dirs() -> StoreResult<Self> {
        let dirs = directories::ProjectDirs::from("", "", "eframe_sketchpad").ok_or_else(|| {
            StoreError::Unavailable("no home directory for the data dir".to_owned())
        })?;
        Ok(Self::new(dirs.data_local_dir()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl DurableStore for FileStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn store(&mut self, key: &str, value: &str) -> StoreResult<()> {
        fs::create_dir_all(&self.dir)?;
        // write-then-rename so a crash never leaves a truncated record
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// `window.localStorage`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> StoreResult<web_sys::Storage> {
        web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window".to_owned()))?
            .local_storage()
            .map_err(|err| StoreError::Unavailable(format!("{err:?}")))?
            .ok_or_else(|| StoreError::Unavailable("localStorage disabled".to_owned()))
    }
}

#[cfg(target_arch = "wasm32")]
impl DurableStore for LocalStorageStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        Self::storage()?
            .get_item(key)
            .map_err(|err| StoreError::Read(format!("{err:?}")))
    }

    fn store(&mut self, key: &str, value: &str) -> StoreResult<()> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|err| StoreError::Write(format!("{err:?}")))
    }
}

/// The default store for the current platform, or a session-only fallback.
pub fn platform_store() -> Box<dyn DurableStore> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        match FileStore::in_project_dirs() {
            Ok(store) => {
                log::info!("Gallery stored in {}", store.dir().display());
                Box::new(store)
            }
            Err(err) => {
                log::warn!("Gallery will not persist: {err}");
                Box::new(MemoryStore::new())
            }
        }
    }
    #[cfg(target_arch = "wasm32")]
    {
        Box::new(LocalStorageStore)
    }
}
