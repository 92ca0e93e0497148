// SideTabs state managers
// Managers own mutable state: the tab list, background frame loading, bookmarks.

pub mod bookmark_manager;
pub mod load_scheduler;
pub mod subscribers;
pub mod tab_store;
