//! In-memory storage area for ephemeral panels and tests.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::storage::StorageArea;
use crate::types::errors::StorageError;

/// A [`StorageArea`] that keeps values in a map and counts writes.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, Value>>,
    writes: Mutex<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|w| *w).unwrap_or(0)
    }
}

impl StorageArea for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let items = self.items.lock().map_err(|_| StorageError::LockPoisoned)?;
        Ok(items.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::LockPoisoned)?;
        items.insert(key.to_string(), value);
        let mut writes = self.writes.lock().map_err(|_| StorageError::LockPoisoned)?;
        *writes += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut items = self.items.lock().map_err(|_| StorageError::LockPoisoned)?;
        items.remove(key);
        Ok(())
    }
}
