//! Durable key-value storage
//!
//! The timer collection is persisted as one JSON document under a fixed key.
//! Stores only deal in strings; encoding lives in the collection helpers below.

pub mod file_store;
pub mod memory_store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

use tracing::{debug, warn};

use crate::{error::StorageError, state::Timer};

/// Key the timer collection is stored under
pub const TIMERS_KEY: &str = "meintimers";

/// Minimal string key-value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Serialize the full collection
pub fn encode_timers(timers: &[Timer]) -> Result<String, StorageError> {
    Ok(serde_json::to_string(timers)?)
}

/// Serialize and store the full collection
pub fn save_timers(store: &dyn KeyValueStore, timers: &[Timer]) -> Result<(), StorageError> {
    store.set(TIMERS_KEY, &encode_timers(timers)?)
}

/// Load the collection, falling back to empty on any failure
pub fn load_timers(store: &dyn KeyValueStore) -> Vec<Timer> {
    let raw = match store.get(TIMERS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No saved timers found");
            return Vec::new();
        }
        Err(e) => {
            warn!("Failed to read saved timers: {}", e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Timer>>(&raw) {
        Ok(timers) => {
            debug!("Loaded {} saved timers", timers.len());
            timers.iter().map(Timer::normalized).collect()
        }
        Err(e) => {
            warn!("Failed to parse saved timers: {}", e);
            Vec::new()
        }
    }
}
