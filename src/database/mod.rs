//! SideTabs persistence layer.
//!
//! Provides SQLite connection management, schema migrations and the
//! key/value storage areas the stores write through.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use sidetabs::database::{Database, SqliteStorage, StorageArea, AreaKind};
//!
//! let db = Arc::new(Database::open("sidetabs.db").expect("failed to open database"));
//! let local = SqliteStorage::new(db.clone(), AreaKind::Local);
//! local.set("greeting", serde_json::json!("hello")).expect("write failed");
//! ```

pub mod connection;
pub mod memory;
pub mod migrations;
pub mod storage;

pub use connection::Database;
pub use memory::MemoryStorage;
pub use storage::{AreaKind, SqliteStorage, StorageArea};

/// Key holding the tab list and active tab id in the local area.
pub const TABS_KEY: &str = "panel_tabs";
/// Key holding the bookmark list in the local area.
pub const BOOKMARKS_KEY: &str = "panel_bookmarks";
/// Key holding the persistence preference in the sync area.
pub const PERSISTENCE_PREF_KEY: &str = "persistence_enabled";
