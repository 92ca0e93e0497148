//! Tab Store for SideTabs.
//!
//! Owns the ordered tab list and the active tab pointer. Every change is
//! announced to subscribers before the mutating call returns, and a snapshot
//! of the state is written to storage after a trailing debounce.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::database::{StorageArea, TABS_KEY};
use crate::managers::subscribers::{SubscriptionId, Subscribers};
use crate::services::clock::now_millis;
use crate::services::preferences::Preferences;
use crate::types::errors::StorageError;
use crate::types::session::{SessionData, SessionTab};
use crate::types::settings::TabSettings;
use crate::types::tab::{is_internal_url, Tab};

/// Callback receiving the full tab list and the active tab id.
pub type TabListener = dyn FnMut(&[Tab], Option<&str>) + Send;

/// Trait defining the tab store interface.
pub trait TabStoreTrait {
    fn init(&mut self) -> Result<(), StorageError>;
    fn subscribe(&mut self, listener: Box<TabListener>) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
    fn add_tab(&mut self, title: Option<&str>, url: Option<&str>) -> String;
    fn remove_tab(&mut self, tab_id: &str);
    fn set_active_tab(&mut self, tab_id: &str);
    fn update_tab_url(&mut self, tab_id: &str, url: &str);
    fn update_tab_title(&mut self, tab_id: &str, title: &str);
    fn get_tabs(&self) -> &[Tab];
    fn get_active_tab_id(&self) -> Option<&str>;
    fn get_active_tab(&self) -> Option<&Tab>;
    fn should_keep_tab_loaded(&self, tab: &Tab) -> bool;
}

/// Result of validating a stored session against the live invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredTabs {
    pub tabs: Vec<Tab>,
    pub active_tab_id: Option<String>,
    /// True if anything had to be fixed, which warrants writing the state back.
    pub repaired: bool,
}

/// Turns a stored session into live tabs.
///
/// Internal pages are dropped, duplicate ids get fresh ids, missing
/// timestamps become `now_ms`, and a dangling active id falls back to the
/// first tab (or none when the list is empty).
pub fn restore_session(session: SessionData, internal_prefixes: &[String], now_ms: i64) -> RestoredTabs {
    let mut repaired = false;
    let mut seen_ids = HashSet::new();
    let mut tabs = Vec::with_capacity(session.tabs.len());

    for stored in session.tabs {
        if is_internal_url(&stored.url, internal_prefixes) {
            continue;
        }

        let last_active = match stored.last_active {
            Some(ts) if ts > 0 => ts,
            _ => {
                repaired = true;
                now_ms
            }
        };

        let id = if seen_ids.contains(&stored.id) {
            repaired = true;
            TabStore::generate_id()
        } else {
            stored.id
        };
        seen_ids.insert(id.clone());

        tabs.push(Tab {
            id,
            title: stored.title,
            url: stored.url,
            last_active,
        });
    }

    let active_exists = session
        .active_tab_id
        .as_ref()
        .is_some_and(|active| tabs.iter().any(|t| &t.id == active));

    let active_tab_id = if active_exists {
        session.active_tab_id
    } else if let Some(first) = tabs.first() {
        repaired = true;
        Some(first.id.clone())
    } else {
        if session.active_tab_id.is_some() {
            repaired = true;
        }
        None
    };

    RestoredTabs {
        tabs,
        active_tab_id,
        repaired,
    }
}

/// Writes `snapshot` unless the user has switched persistence off.
///
/// Returns whether anything was written.
fn write_snapshot(
    storage: &dyn StorageArea,
    preferences: &Preferences,
    snapshot: &SessionData,
) -> Result<bool, StorageError> {
    if !preferences.persistence_enabled()? {
        log::debug!("tab persistence disabled, skipping save");
        return Ok(false);
    }
    storage.set(TABS_KEY, serde_json::to_value(snapshot)?)?;
    Ok(true)
}

/// A save that has been scheduled but not written yet.
enum PendingSave {
    /// Debounce task running on the tokio runtime.
    Timer(JoinHandle<()>),
    /// No runtime was available; the state is written by the next `flush`.
    Deferred,
}

/// In-memory tab store with debounced persistence.
pub struct TabStore {
    tabs: Vec<Tab>,
    active_tab_id: Option<String>,
    listeners: Subscribers<TabListener>,
    storage: Arc<dyn StorageArea>,
    preferences: Preferences,
    settings: TabSettings,
    save_debounce: Duration,
    pending_save: Option<PendingSave>,
}

impl TabStore {
    pub fn new(
        storage: Arc<dyn StorageArea>,
        preferences: Preferences,
        settings: TabSettings,
        save_debounce: Duration,
    ) -> Self {
        Self {
            tabs: Vec::new(),
            active_tab_id: None,
            listeners: Subscribers::new(),
            storage,
            preferences,
            settings,
            save_debounce,
            pending_save: None,
        }
    }

    fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn find_tab_index(&self, tab_id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }

    pub fn get_tab(&self, tab_id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    /// First tab (in display order) currently showing `url`.
    pub fn find_tab_by_url(&self, url: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.url == url)
    }

    /// Same as [`TabStoreTrait::should_keep_tab_loaded`] with an explicit clock.
    pub fn should_keep_tab_loaded_at(&self, tab: &Tab, now_ms: i64) -> bool {
        self.active_tab_id.as_deref() == Some(tab.id.as_str())
            || tab.is_recent(now_ms, self.settings.inactivity_limit_ms)
    }

    /// The state as it would be persisted: internal pages are left out.
    pub fn snapshot(&self) -> SessionData {
        SessionData {
            tabs: self
                .tabs
                .iter()
                .filter(|t| !t.is_internal(&self.settings.internal_url_prefixes))
                .map(SessionTab::from)
                .collect(),
            active_tab_id: self.active_tab_id.clone(),
        }
    }

    /// Returns true while a save is waiting to be written.
    pub fn has_pending_save(&self) -> bool {
        match &self.pending_save {
            Some(PendingSave::Timer(handle)) => !handle.is_finished(),
            Some(PendingSave::Deferred) => true,
            None => false,
        }
    }

    /// Writes a pending save immediately.
    ///
    /// Returns `Ok(false)` when nothing was pending or persistence is disabled.
    pub fn flush(&mut self) -> Result<bool, StorageError> {
        match self.pending_save.take() {
            Some(PendingSave::Timer(handle)) if !handle.is_finished() => {
                handle.abort();
                write_snapshot(self.storage.as_ref(), &self.preferences, &self.snapshot())
            }
            Some(PendingSave::Deferred) => {
                write_snapshot(self.storage.as_ref(), &self.preferences, &self.snapshot())
            }
            _ => Ok(false),
        }
    }

    /// Cancels any pending save and schedules a new one for the current state.
    ///
    /// Outside a tokio runtime there is no timer to debounce on; the save is
    /// only marked pending and written by [`TabStore::flush`].
    fn schedule_save(&mut self) {
        if let Some(PendingSave::Timer(handle)) = self.pending_save.take() {
            handle.abort();
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.pending_save = Some(PendingSave::Deferred);
            return;
        };

        let snapshot = self.snapshot();
        let storage = Arc::clone(&self.storage);
        let preferences = self.preferences.clone();
        let delay = self.save_debounce;
        self.pending_save = Some(PendingSave::Timer(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = write_snapshot(storage.as_ref(), &preferences, &snapshot) {
                log::warn!("failed to save tabs: {}", e);
            }
        })));
    }

    fn notify(&mut self) {
        let active = self.active_tab_id.as_deref();
        for listener in self.listeners.iter_mut() {
            listener(&self.tabs, active);
        }
    }

    fn commit(&mut self) {
        self.schedule_save();
        self.notify();
    }

    fn load_persisted(&self) -> Result<RestoredTabs, StorageError> {
        if !self.preferences.persistence_enabled()? {
            return Ok(RestoredTabs {
                tabs: Vec::new(),
                active_tab_id: None,
                repaired: false,
            });
        }

        let (session, dropped) = match self.storage.get(TABS_KEY)? {
            Some(value) => SessionData::decode_lenient(value)?,
            None => (SessionData::default(), 0),
        };
        if dropped > 0 {
            log::warn!("dropped {} unreadable stored tabs", dropped);
        }

        let mut restored = restore_session(session, &self.settings.internal_url_prefixes, now_millis());
        restored.repaired |= dropped > 0;
        Ok(restored)
    }
}

impl TabStoreTrait for TabStore {
    /// Restores tabs from storage and notifies subscribers.
    ///
    /// Subscribers are notified even when loading fails; the store then starts
    /// empty and the error is returned for the caller to log.
    fn init(&mut self) -> Result<(), StorageError> {
        let result = match self.load_persisted() {
            Ok(restored) => {
                self.tabs = restored.tabs;
                self.active_tab_id = restored.active_tab_id;
                if restored.repaired {
                    self.schedule_save();
                }
                Ok(())
            }
            Err(e) => {
                self.tabs.clear();
                self.active_tab_id = None;
                Err(e)
            }
        };

        self.notify();
        result
    }

    fn subscribe(&mut self, listener: Box<TabListener>) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    /// Inserts a new tab at the front and makes it active. Returns its id.
    fn add_tab(&mut self, title: Option<&str>, url: Option<&str>) -> String {
        let id = Self::generate_id();
        let tab = Tab {
            id: id.clone(),
            title: title
                .filter(|t| !t.is_empty())
                .unwrap_or(self.settings.default_title.as_str())
                .to_string(),
            url: url
                .filter(|u| !u.is_empty())
                .unwrap_or(self.settings.default_url.as_str())
                .to_string(),
            last_active: now_millis(),
        };

        self.tabs.insert(0, tab);
        self.active_tab_id = Some(id.clone());
        self.commit();
        id
    }

    /// Removes a tab. Closing the active tab selects the tab just before it,
    /// or the new first tab when it was at the front.
    fn remove_tab(&mut self, tab_id: &str) {
        let Some(index) = self.find_tab_index(tab_id) else {
            return;
        };

        self.tabs.remove(index);

        if self.active_tab_id.as_deref() == Some(tab_id) {
            self.active_tab_id = if self.tabs.is_empty() {
                None
            } else {
                let safe_index = index.saturating_sub(1).min(self.tabs.len() - 1);
                Some(self.tabs[safe_index].id.clone())
            };
        }

        self.commit();
    }

    /// Activates a tab and stamps both the outgoing and incoming tab.
    fn set_active_tab(&mut self, tab_id: &str) {
        if self.active_tab_id.as_deref() == Some(tab_id) || self.find_tab_index(tab_id).is_none() {
            return;
        }

        let previous = self.active_tab_id.replace(tab_id.to_string());
        let now = now_millis();
        for tab in self.tabs.iter_mut() {
            if tab.id == tab_id || previous.as_deref() == Some(tab.id.as_str()) {
                tab.last_active = now;
            }
        }

        self.commit();
    }

    fn update_tab_url(&mut self, tab_id: &str, url: &str) {
        let Some(index) = self.find_tab_index(tab_id) else {
            return;
        };
        if self.tabs[index].url == url {
            return;
        }
        self.tabs[index].url = url.to_string();
        self.commit();
    }

    fn update_tab_title(&mut self, tab_id: &str, title: &str) {
        let Some(index) = self.find_tab_index(tab_id) else {
            return;
        };
        if self.tabs[index].title == title {
            return;
        }
        self.tabs[index].title = title.to_string();
        self.commit();
    }

    fn get_tabs(&self) -> &[Tab] {
        &self.tabs
    }

    fn get_active_tab_id(&self) -> Option<&str> {
        self.active_tab_id.as_deref()
    }

    fn get_active_tab(&self) -> Option<&Tab> {
        self.active_tab_id
            .as_deref()
            .and_then(|id| self.get_tab(id))
    }

    /// True for the active tab and for tabs used within the inactivity limit.
    fn should_keep_tab_loaded(&self, tab: &Tab) -> bool {
        self.should_keep_tab_loaded_at(tab, now_millis())
    }
}
