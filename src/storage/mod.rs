//! Persisted key-value storage: the session token and the last ticker price
//! survive restarts through this layer.
//!
//! - [`MemoryStore`]: process-local, used by default and in tests.
//! - [`FileStore`]: a JSON file on disk (native only).
//! - [`LocalStorage`]: the browser's `window.localStorage` (`ws-wasm` feature).

#[cfg(not(target_arch = "wasm32"))]
mod file;

#[cfg(feature = "ws-wasm")]
mod web;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

#[cfg(feature = "ws-wasm")]
pub use web::LocalStorage;

use crate::error::StorageError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Key under which the bearer token is persisted.
pub const TOKEN_KEY: &str = "cex_jwt_token";

/// Key under which the last seen ticker price is persisted.
pub const TICKER_PRICE_KEY: &str = "cex_last_price";

/// Minimal string key-value store, shaped after browser `localStorage`.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to a store, cloned into every component that persists state.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// In-memory store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor returning a [`SharedStore`].
    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }
}
