//! # Storage Module - Keyed Local Persistence
//!
//! Every piece of game data lives under a string key in a small key-value
//! store, one JSON document per key:
//!
//! ```text
//! users            ← JSON array of accounts
//! currentUser      ← active session (absent when logged out)
//! game_<id>        ← position / counters for one identity
//! comments_<id>    ← cell annotations for one identity
//! settings_<id>    ← free-form settings, only used by export/import
//! ```
//!
//! Three backends implement [`KvStore`]:
//!
//! - [`FileStore`] - one `<key>.json` file per key under `data_dir`, written
//!   atomically under an exclusive `fs2` lock
//! - [`SledStore`] - a single embedded sled tree
//! - [`MemoryStore`] - process-local map with an optional byte quota
//!
//! ## Failure Model
//!
//! [`Storage`] wraps a backend and never returns errors to callers:
//!
//! - reads that fail (or hit malformed JSON) come back as `None`
//! - writes that fail return `false` and switch the facade into
//!   memory-only mode; from then on all reads and writes go through an
//!   in-memory overlay so the current session stays playable
//!
//! ## Usage
//!
//! ```rust,no_run
//! use snakeladder::config::StorageConfig;
//! use snakeladder::storage::{keys, Storage};
//!
//! let mut storage = Storage::open_or_memory(&StorageConfig::default());
//! let saved = storage.set_raw(&keys::settings("guest"), "{\"theme\":\"dark\"}");
//! assert!(saved || !storage.is_persistent());
//! ```

pub mod file_store;
pub mod memory;
pub mod retention;
pub mod sled_store;
pub mod transfer;

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{StorageBackend, StorageConfig};

pub use file_store::FileStore;
pub use memory::MemoryStore;
pub use sled_store::SledStore;

/// Errors raised by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("value under '{0}' is not valid utf-8")]
    Utf8(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store refused the operation (quota exhausted, closed, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Minimal synchronous key-value contract shared by all backends.
pub trait KvStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
    /// Backend label for logs and status output.
    fn name(&self) -> &'static str;
}

/// Key layout. Identity ids are opaque; the guest uses the literal `guest`.
pub mod keys {
    pub const USERS: &str = "users";
    pub const CURRENT_USER: &str = "currentUser";

    pub fn game(identity_id: &str) -> String {
        format!("game_{}", identity_id)
    }

    pub fn comments(identity_id: &str) -> String {
        format!("comments_{}", identity_id)
    }

    pub fn settings(identity_id: &str) -> String {
        format!("settings_{}", identity_id)
    }
}

/// Fail-open facade over a [`KvStore`].
pub struct Storage {
    backend: Box<dyn KvStore>,
    /// Writes made after degradation; `None` marks a removed key.
    overlay: BTreeMap<String, Option<String>>,
    degraded: bool,
}

impl Storage {
    pub fn new(backend: Box<dyn KvStore>) -> Self {
        Storage {
            backend,
            overlay: BTreeMap::new(),
            degraded: false,
        }
    }

    /// Purely in-memory storage (nothing survives the process).
    pub fn memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Open the backend selected in `config`.
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        let backend: Box<dyn KvStore> = match config.backend {
            StorageBackend::Files => Box::new(FileStore::open(&config.data_dir)?),
            StorageBackend::Sled => {
                let path = std::path::Path::new(&config.data_dir).join("kv.sled");
                Box::new(SledStore::open(path)?)
            }
            StorageBackend::Memory => Box::new(MemoryStore::new()),
        };
        debug!("storage: opened {} backend at {}", backend.name(), config.data_dir);
        Ok(Self::new(backend))
    }

    /// Like [`Storage::open`], but falls back to a degraded memory-only
    /// store when the backend cannot be opened.
    pub fn open_or_memory(config: &StorageConfig) -> Self {
        match Self::open(config) {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    "storage: {} backend unavailable at {} ({}); progress will not be saved",
                    config.backend, config.data_dir, e
                );
                let mut s = Self::memory();
                s.degraded = true;
                s
            }
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// True when writes are reaching a durable backend.
    pub fn is_persistent(&self) -> bool {
        !self.degraded && self.backend.name() != memory::BACKEND_NAME
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn degrade(&mut self, key: &str, err: &StoreError) {
        if !self.degraded {
            warn!(
                "storage: write to '{}' failed ({}); switching to memory-only mode",
                key, err
            );
        }
        self.degraded = true;
    }

    pub fn get_raw(&self, key: &str) -> Option<String> {
        if let Some(v) = self.overlay.get(key) {
            return v.clone();
        }
        match self.backend.get(key) {
            Ok(v) => v,
            Err(e) => {
                warn!("storage: read of '{}' failed: {}", key, e);
                None
            }
        }
    }

    /// Store `value` under `key`. Returns whether the write reached the backend.
    pub fn set_raw(&mut self, key: &str, value: &str) -> bool {
        if self.degraded {
            self.overlay.insert(key.to_string(), Some(value.to_string()));
            return false;
        }
        match self.backend.set(key, value) {
            Ok(()) => {
                debug!("storage: wrote '{}' ({} bytes)", key, value.len());
                true
            }
            Err(e) => {
                self.degrade(key, &e);
                self.overlay.insert(key.to_string(), Some(value.to_string()));
                false
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        if self.degraded {
            self.overlay.insert(key.to_string(), None);
            return false;
        }
        match self.backend.remove(key) {
            Ok(()) => true,
            Err(e) => {
                self.degrade(key, &e);
                self.overlay.insert(key.to_string(), None);
                false
            }
        }
    }

    /// All live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut set: BTreeSet<String> = match self.backend.keys() {
            Ok(k) => k.into_iter().collect(),
            Err(e) => {
                warn!("storage: listing keys failed: {}", e);
                BTreeSet::new()
            }
        };
        for (k, v) in &self.overlay {
            match v {
                Some(_) => {
                    set.insert(k.clone());
                }
                None => {
                    set.remove(k);
                }
            }
        }
        set.into_iter().collect()
    }

    /// Decode the JSON document under `key`. Missing and malformed records
    /// both yield `None`; the latter is logged.
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key)?;
        let cleaned = raw.trim_start_matches('\0');
        match serde_json::from_str(cleaned) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("storage: ignoring malformed record '{}': {}", key, e);
                None
            }
        }
    }

    pub fn save_json<T: Serialize>(&mut self, key: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(data) => self.set_raw(key, &data),
            Err(e) => {
                warn!("storage: serialize error for '{}': {}", key, e);
                false
            }
        }
    }
}
