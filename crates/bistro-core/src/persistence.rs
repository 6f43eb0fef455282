//! Key-value persistence for the running money total and table purchase flags.
//!
//! The store is injected into the engine as a trait object rather than looked
//! up globally. Values are encoded with bincode. `FileStore` keeps a full
//! in-memory cache and rewrites the whole file on `flush`, mirroring a cached
//! save file; `MemoryStore` backs tests and headless runs.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Key-value persistence surface.
///
/// `set_raw` only touches the in-memory cache; `flush` commits to the
/// backing medium, where one exists.
pub trait KvStore {
    fn get_raw(&self, key: &str) -> Option<&[u8]>;
    fn set_raw(&mut self, key: &str, value: Vec<u8>);
    fn has_key(&self, key: &str) -> bool;
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Decode a stored value; unknown or unreadable keys yield `None`
pub fn get<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    store
        .get_raw(key)
        .and_then(|bytes| bincode::deserialize(bytes).ok())
}

/// Decode a stored value, falling back to `T::default()`
pub fn get_or_default<T: DeserializeOwned + Default>(store: &dyn KvStore, key: &str) -> T {
    get(store, key).unwrap_or_default()
}

/// Encode and cache a value under `key`
pub fn set<T: Serialize>(store: &mut dyn KvStore, key: &str, value: &T) {
    // Plain-data values encode infallibly under bincode
    if let Ok(bytes) = bincode::serialize(value) {
        store.set_raw(key, bytes);
    }
}

/// In-memory store for tests and headless runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    fn set_raw(&mut self, key: &str, value: Vec<u8>) {
        self.entries.insert(key.to_string(), value);
    }

    fn has_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

/// File-backed store with a whole-file cache
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: HashMap<String, Vec<u8>>,
}

impl FileStore {
    /// Open a store, loading the existing file if present
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let cache = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            bincode::deserialize_from(reader)?
        } else {
            HashMap::new()
        };
        Ok(Self { path, cache })
    }
}

impl KvStore for FileStore {
    fn get_raw(&self, key: &str) -> Option<&[u8]> {
        self.cache.get(key).map(Vec::as_slice)
    }

    fn set_raw(&mut self, key: &str, value: Vec<u8>) {
        self.cache.insert(key.to_string(), value);
    }

    fn has_key(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        let writer = BufWriter::new(File::create(&self.path)?);
        bincode::serialize_into(writer, &self.cache)?;
        Ok(())
    }
}

/// Errors that can occur opening or flushing a store
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Encoding(Box<bincode::ErrorKind>),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for StoreError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        StoreError::Encoding(e)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "IO error: {}", e),
            StoreError::Encoding(e) => write!(f, "Store encoding error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}
