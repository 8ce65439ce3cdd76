// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Storage port for persisted settings documents.
//!
//! A store holds one opaque document per key. Typed loading and defaults
//! live with the settings type (see `vrseg_core::config`).

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use thiserror::Error;

/// Keyed document storage.
pub trait ConfigStore {
    /// Reads the document under `key`, or `None` if nothing was ever written.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError>;
    /// Replaces the document under `key`.
    fn write(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Settings storage failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Keys are non-empty and limited to ASCII alphanumerics, `-` and `_`.
    #[error("invalid config key {0:?}")]
    InvalidKey(String),
    /// The platform has no per-user config directory.
    #[error("no config directory available")]
    NoConfigDir,
    /// Underlying storage failed.
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    /// The document under `key` is not valid for its type.
    #[error("config {key:?}: {source}")]
    Json {
        /// Document key.
        key: String,
        /// Decode or encode failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Rejects keys that could not name a single flat document.
pub fn check_key(key: &str) -> Result<(), ConfigError> {
    let ok = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(ConfigError::InvalidKey(key.to_owned()))
    }
}

/// Store kept in memory, for tests and hosts without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    docs: RefCell<BTreeMap<String, Vec<u8>>>,
    writes: Cell<usize>,
}

impl MemoryConfigStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        check_key(key)?;
        Ok(self.docs.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        check_key(key)?;
        self.docs.borrow_mut().insert(key.to_owned(), data.to_vec());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
