//! Access to the persistence preference shared with the settings page.
//!
//! The value lives in the sync area and can change underneath the panel at any
//! time, so it is never cached: every call reads storage.

use std::sync::Arc;

use serde_json::Value;

use crate::database::{StorageArea, PERSISTENCE_PREF_KEY};
use crate::types::errors::StorageError;

/// Handle on the shared preference area.
#[derive(Clone)]
pub struct Preferences {
    area: Arc<dyn StorageArea>,
}

impl Preferences {
    pub fn new(area: Arc<dyn StorageArea>) -> Self {
        Self { area }
    }

    /// Whether tab state should be written to and restored from storage.
    ///
    /// Anything other than an explicit `false` counts as enabled.
    pub fn persistence_enabled(&self) -> Result<bool, StorageError> {
        let value = self.area.get(PERSISTENCE_PREF_KEY)?;
        Ok(!matches!(value, Some(Value::Bool(false))))
    }

    pub fn set_persistence_enabled(&self, enabled: bool) -> Result<(), StorageError> {
        self.area.set(PERSISTENCE_PREF_KEY, Value::Bool(enabled))
    }
}
