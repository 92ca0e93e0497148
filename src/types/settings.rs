use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level panel settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PanelSettings {
    #[serde(default)]
    pub tabs: TabSettings,
    #[serde(default)]
    pub persistence: PersistenceSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub bookmarks: BookmarkSettings,
}

/// Tab defaults and lifetime limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabSettings {
    pub default_title: String,
    pub default_url: String,
    /// Inactive tabs older than this are unloaded instead of background-loaded.
    pub inactivity_limit_ms: i64,
    /// Url prefixes of extension-internal pages that are never persisted.
    pub internal_url_prefixes: Vec<String>,
}

impl Default for TabSettings {
    fn default() -> Self {
        Self {
            default_title: "New".to_string(),
            default_url: "https://gemini.google.com/app".to_string(),
            inactivity_limit_ms: 2 * 60 * 60 * 1000,
            internal_url_prefixes: vec![
                "chrome-extension://".to_string(),
                "moz-extension://".to_string(),
            ],
        }
    }
}

/// Durable state write policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistenceSettings {
    pub save_debounce_ms: u64,
}

impl PersistenceSettings {
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self { save_debounce_ms: 500 }
    }
}

/// Background load pacing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerSettings {
    /// Delay between two background loads.
    pub drain_period_ms: u64,
}

impl SchedulerSettings {
    pub fn drain_period(&self) -> Duration {
        Duration::from_millis(self.drain_period_ms)
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self { drain_period_ms: 1500 }
    }
}

/// Bookmark housekeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookmarkSettings {
    /// Clear every `broken` flag when the panel starts, so links get re-checked.
    pub reset_broken_on_startup: bool,
}

impl Default for BookmarkSettings {
    fn default() -> Self {
        Self { reset_broken_on_startup: true }
    }
}
