//! App Core for SideTabs.
//!
//! Wires the tab store, the background load scheduler and the bookmark
//! manager together, translates UI events into store calls, and drives the
//! drain timer.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::database::{AreaKind, Database, MemoryStorage, SqliteStorage, StorageArea};
use crate::managers::bookmark_manager::{BookmarkListener, BookmarkManager, BookmarkManagerTrait};
use crate::managers::load_scheduler::{FrameHost, LoadScheduler};
use crate::managers::subscribers::SubscriptionId;
use crate::managers::tab_store::{TabListener, TabStore, TabStoreTrait};
use crate::services::link_validator;
use crate::services::preferences::Preferences;
use crate::types::events::UiEvent;
use crate::types::settings::PanelSettings;
use crate::types::tab::{is_internal_url, Tab};

/// The two storage areas the panel persists through.
#[derive(Clone)]
pub struct AppStorage {
    pub local: Arc<dyn StorageArea>,
    pub sync: Arc<dyn StorageArea>,
}

impl AppStorage {
    /// Both areas in one SQLite database.
    pub fn sqlite(db: Arc<Database>) -> Self {
        Self {
            local: Arc::new(SqliteStorage::new(db.clone(), AreaKind::Local)),
            sync: Arc::new(SqliteStorage::new(db, AreaKind::Sync)),
        }
    }

    /// Nothing survives the process.
    pub fn in_memory() -> Self {
        Self {
            local: Arc::new(MemoryStorage::new()),
            sync: Arc::new(MemoryStorage::new()),
        }
    }
}

/// Central coordinator holding the stores and the scheduler.
pub struct App {
    pub settings: PanelSettings,
    pub tab_store: TabStore,
    pub bookmarks: BookmarkManager,
    pub preferences: Preferences,
    scheduler: Arc<Mutex<LoadScheduler>>,
}

impl App {
    /// Creates the coordinator. The scheduler is subscribed to the tab store
    /// first, so it reconciles before any render listener runs.
    pub fn new(settings: PanelSettings, storage: AppStorage, frames: Box<dyn FrameHost>) -> Self {
        let preferences = Preferences::new(storage.sync.clone());
        let mut tab_store = TabStore::new(
            storage.local.clone(),
            preferences.clone(),
            settings.tabs.clone(),
            settings.persistence.save_debounce(),
        );
        let scheduler = Arc::new(Mutex::new(LoadScheduler::new(
            frames,
            settings.scheduler.drain_period(),
            settings.tabs.inactivity_limit_ms,
        )));

        let reconciler = Arc::clone(&scheduler);
        tab_store.subscribe(Box::new(move |tabs: &[Tab], active: Option<&str>| match reconciler.lock() {
            Ok(mut scheduler) => scheduler.reconcile(tabs, active),
            Err(_) => log::warn!("load scheduler lock poisoned, skipping reconcile"),
        }));

        let bookmarks = BookmarkManager::new(storage.local);

        Self {
            settings,
            tab_store,
            bookmarks,
            preferences,
            scheduler,
        }
    }

    /// Registers the view's render callback.
    pub fn subscribe_render(&mut self, listener: Box<TabListener>) -> SubscriptionId {
        self.tab_store.subscribe(listener)
    }

    pub fn subscribe_bookmarks(&mut self, listener: Box<BookmarkListener>) -> SubscriptionId {
        self.bookmarks.subscribe(listener)
    }

    /// Startup sequence: restore tabs and bookmarks, reset broken flags,
    /// guarantee one open tab.
    pub fn startup(&mut self) {
        if let Err(e) = self.tab_store.init() {
            log::warn!("failed to restore tabs, starting empty: {}", e);
        }
        if let Err(e) = self.bookmarks.init() {
            log::warn!("failed to load bookmarks: {}", e);
        }
        if self.settings.bookmarks.reset_broken_on_startup {
            if let Err(e) = self.bookmarks.clear_broken_flags() {
                log::warn!("failed to reset broken bookmark flags: {}", e);
            }
        }
        self.ensure_tab();

        log::info!(
            "panel started with {} tabs and {} bookmarks",
            self.tab_store.get_tabs().len(),
            self.bookmarks.get_bookmarks().len()
        );
    }

    /// Shutdown sequence: write any debounced tab save now.
    pub fn shutdown(&mut self) {
        match self.tab_store.flush() {
            Ok(true) => log::info!("flushed pending tab state on shutdown"),
            Ok(false) => {}
            Err(e) => log::warn!("failed to flush tab state on shutdown: {}", e),
        }
    }

    fn ensure_tab(&mut self) {
        if self.tab_store.get_tabs().is_empty() {
            self.tab_store.add_tab(None, None);
        }
    }

    /// Applies one UI event.
    pub fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::AddTab => {
                self.tab_store.add_tab(None, None);
            }
            UiEvent::CloseTab { id } => self.close_tab(&id),
            UiEvent::SwitchTab { id } => self.tab_store.set_active_tab(&id),
            UiEvent::UpdateUrl { id, url } => self.tab_store.update_tab_url(&id, &url),
            UiEvent::UpdateTitle { id, title } => self.tab_store.update_tab_title(&id, &title),
            UiEvent::FrameStateChanged {
                tab_id,
                url,
                title,
                auto_redirect,
            } => self.report_frame_state(&tab_id, &url, title.as_deref(), auto_redirect),
            UiEvent::BookmarkSelect { title, url } => {
                self.select_bookmark(&title, &url);
            }
            UiEvent::BookmarkToggleActive => {
                self.toggle_active_bookmark();
            }
            UiEvent::BookmarkRemove { url } => {
                if let Err(e) = self.bookmarks.remove(&url) {
                    log::warn!("failed to save bookmarks: {}", e);
                }
            }
            UiEvent::BookmarkUpdate { url, title } => {
                if let Err(e) = self.bookmarks.update(&url, &title) {
                    log::warn!("failed to save bookmarks: {}", e);
                }
            }
        }
    }

    /// Closes a tab from the UI, reopening a default tab if it was the last one.
    pub fn close_tab(&mut self, tab_id: &str) {
        self.tab_store.remove_tab(tab_id);
        self.ensure_tab();
    }

    /// Focuses the tab already showing `url`, or opens one for it.
    /// Returns the id of the tab that ends up active.
    pub fn select_bookmark(&mut self, title: &str, url: &str) -> String {
        let existing = self.tab_store.find_tab_by_url(url).map(|t| t.id.clone());
        match existing {
            Some(tab_id) => {
                self.tab_store.set_active_tab(&tab_id);
                tab_id
            }
            None => self.tab_store.add_tab(Some(title), Some(url)),
        }
    }

    /// Bookmarks or un-bookmarks the active tab. Internal pages are never
    /// bookmarked. Returns the new membership, or `None` if nothing happened.
    pub fn toggle_active_bookmark(&mut self) -> Option<bool> {
        let (title, url) = {
            let tab = self.tab_store.get_active_tab()?;
            if tab.url.is_empty() || is_internal_url(&tab.url, &self.settings.tabs.internal_url_prefixes) {
                return None;
            }
            (tab.title.clone(), tab.url.clone())
        };

        match self.bookmarks.toggle(&title, &url) {
            Ok(bookmarked) => Some(bookmarked),
            Err(e) => {
                log::warn!("failed to save bookmarks: {}", e);
                Some(self.bookmarks.is_bookmarked(&url))
            }
        }
    }

    /// Applies a navigation report from a frame.
    ///
    /// An automatic redirect away from a bookmarked conversation marks that
    /// bookmark broken before the tab's url is updated.
    pub fn report_frame_state(&mut self, tab_id: &str, url: &str, title: Option<&str>, auto_redirect: bool) {
        let intended = self.tab_store.get_tab(tab_id).map(|t| t.url.clone());
        if let Some(intended) = intended {
            if link_validator::is_broken_link(auto_redirect, Some(intended.as_str())) && self.bookmarks.is_bookmarked(&intended) {
                log::debug!("bookmark {} redirected to {}, marking broken", intended, url);
                if let Err(e) = self.bookmarks.mark_broken(&intended, true) {
                    log::warn!("failed to save bookmarks: {}", e);
                }
            }
        }

        self.tab_store.update_tab_url(tab_id, url);
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            self.tab_store.update_tab_title(tab_id, title);
        }
    }

    /// Whether the tab's frame currently holds loaded content.
    pub fn is_tab_loaded(&self, tab_id: &str) -> bool {
        self.scheduler
            .lock()
            .map(|s| s.is_loaded(tab_id))
            .unwrap_or(false)
    }

    pub fn is_tab_queued(&self, tab_id: &str) -> bool {
        self.scheduler
            .lock()
            .map(|s| s.is_queued(tab_id))
            .unwrap_or(false)
    }

    /// Ids of tabs with loaded frames, in display order.
    pub fn loaded_tab_ids(&self) -> Vec<String> {
        self.tab_store
            .get_tabs()
            .iter()
            .filter(|t| self.is_tab_loaded(&t.id))
            .map(|t| t.id.clone())
            .collect()
    }

    pub fn next_drain_deadline(&self) -> Option<Instant> {
        self.scheduler.lock().ok().and_then(|s| s.next_drain_deadline())
    }

    /// Runs one background load tick. Returns the id of the tab that was loaded.
    pub fn drain_tick(&mut self) -> Option<String> {
        match self.scheduler.lock() {
            Ok(mut scheduler) => scheduler.drain_tick(Instant::now()),
            Err(_) => {
                log::warn!("load scheduler lock poisoned, skipping drain tick");
                None
            }
        }
    }

    /// Event loop: applies events as they arrive and fires drain ticks when
    /// due. Returns after the sender side closes, flushing pending state.
    pub async fn run(&mut self, mut events: mpsc::Receiver<UiEvent>) {
        loop {
            let deadline = self.next_drain_deadline();
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                _ = wait_until(deadline) => {
                    self.drain_tick();
                }
            }
        }
        self.shutdown();
    }
}

/// Sleeps until `deadline`, or forever when there is none.
pub async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
