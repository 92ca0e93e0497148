//! Key/value storage areas backed by the `storage_items` table.

use std::sync::Arc;

use rusqlite::{params, OptionalExtension};
use serde_json::Value;

use super::connection::Database;
use crate::services::clock::now_millis;
use crate::types::errors::StorageError;

/// A namespace of JSON values addressed by string keys.
///
/// Implementations must be shareable with background tasks, so every method
/// takes `&self` and the trait requires `Send + Sync`.
pub trait StorageArea: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Which logical area a [`SqliteStorage`] reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaKind {
    /// Panel-private state: tabs and bookmarks.
    Local,
    /// State shared with other surfaces such as the settings page.
    Sync,
}

impl AreaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaKind::Local => "local",
            AreaKind::Sync => "sync",
        }
    }
}

/// Storage area stored in a SQLite database shared between areas.
#[derive(Clone)]
pub struct SqliteStorage {
    db: Arc<Database>,
    area: AreaKind,
}

impl SqliteStorage {
    pub fn new(db: Arc<Database>, area: AreaKind) -> Self {
        Self { db, area }
    }
}

impl StorageArea for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let conn = self.db.connection()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT value FROM storage_items WHERE area = ?1 AND key = ?2",
                params![self.area.as_str(), key],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let text = serde_json::to_string(&value)?;
        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO storage_items (area, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(area, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![self.area.as_str(), key, text, now_millis()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let conn = self.db.connection()?;
        conn.execute(
            "DELETE FROM storage_items WHERE area = ?1 AND key = ?2",
            params![self.area.as_str(), key],
        )?;
        Ok(())
    }
}
