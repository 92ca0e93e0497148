//! Background Load Scheduler for SideTabs.
//!
//! Decides which tab frames hold loaded content. The active tab loads at once;
//! recently used tabs are queued and hydrated one at a time on a fixed period;
//! tabs idle past the inactivity limit are unloaded to free memory and sockets.
//!
//! The scheduler never touches frames itself. It sends [`FrameCommand`]s to a
//! [`FrameHost`] and keeps its own record of which tabs are loaded.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use tokio::time::Instant;

use crate::services::clock::now_millis;
use crate::types::frame::FrameCommand;
use crate::types::tab::Tab;

/// Receiver of frame commands, implemented by the embedding layer.
pub trait FrameHost: Send {
    fn apply(&mut self, command: FrameCommand);
}

impl<F> FrameHost for F
where
    F: FnMut(FrameCommand) + Send,
{
    fn apply(&mut self, command: FrameCommand) {
        self(command)
    }
}

/// How a tab is treated during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabClass {
    Active,
    Recent,
    Stale,
}

/// Classifies `tab` relative to the active id and the inactivity limit.
pub fn classify(tab: &Tab, active_tab_id: Option<&str>, now_ms: i64, inactivity_limit_ms: i64) -> TabClass {
    if active_tab_id == Some(tab.id.as_str()) {
        TabClass::Active
    } else if tab.is_recent(now_ms, inactivity_limit_ms) {
        TabClass::Recent
    } else {
        TabClass::Stale
    }
}

pub struct LoadScheduler {
    host: Box<dyn FrameHost>,
    /// Tabs seen at the last reconciliation; the drain loads from this list.
    current_tabs: Vec<Tab>,
    /// Loaded tab id -> url the frame was pointed at.
    loaded: HashMap<String, String>,
    queue: VecDeque<String>,
    current: Option<String>,
    drain_deadline: Option<Instant>,
    drain_period: Duration,
    inactivity_limit_ms: i64,
}

impl LoadScheduler {
    pub fn new(host: Box<dyn FrameHost>, drain_period: Duration, inactivity_limit_ms: i64) -> Self {
        Self {
            host,
            current_tabs: Vec::new(),
            loaded: HashMap::new(),
            queue: VecDeque::new(),
            current: None,
            drain_deadline: None,
            drain_period,
            inactivity_limit_ms,
        }
    }

    pub fn is_loaded(&self, tab_id: &str) -> bool {
        self.loaded.contains_key(tab_id)
    }

    /// Url the tab's frame was loaded with, if it is loaded.
    pub fn loaded_url(&self, tab_id: &str) -> Option<&str> {
        self.loaded.get(tab_id).map(String::as_str)
    }

    pub fn is_queued(&self, tab_id: &str) -> bool {
        self.queue.iter().any(|id| id == tab_id)
    }

    /// Queued tab ids, oldest first.
    pub fn queued(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    pub fn loaded_ids(&self) -> impl Iterator<Item = &str> {
        self.loaded.keys().map(String::as_str)
    }

    pub fn is_draining(&self) -> bool {
        self.drain_deadline.is_some()
    }

    /// When the next background load is due, if the drain is running.
    pub fn next_drain_deadline(&self) -> Option<Instant> {
        self.drain_deadline
    }

    /// Reconciles against the current wall clock.
    pub fn reconcile(&mut self, tabs: &[Tab], active_tab_id: Option<&str>) {
        self.reconcile_at(tabs, active_tab_id, now_millis(), Instant::now());
    }

    /// Brings loaded frames and the queue in line with `tabs`.
    ///
    /// `now_ms` is wall time for the activity comparison; `now` anchors the
    /// first drain tick if the drain has to be started.
    pub fn reconcile_at(&mut self, tabs: &[Tab], active_tab_id: Option<&str>, now_ms: i64, now: Instant) {
        let present: HashSet<&str> = tabs.iter().map(|t| t.id.as_str()).collect();

        let gone: Vec<String> = self
            .loaded
            .keys()
            .filter(|id| !present.contains(id.as_str()))
            .cloned()
            .collect();
        for tab_id in gone {
            self.unload(&tab_id);
        }
        self.queue.retain(|id| present.contains(id.as_str()));
        if self.current.as_deref().is_some_and(|id| !present.contains(id)) {
            self.current = None;
        }

        for tab in tabs {
            match classify(tab, active_tab_id, now_ms, self.inactivity_limit_ms) {
                TabClass::Active => {
                    self.dequeue(&tab.id);
                    if !self.is_loaded(&tab.id) {
                        self.load(tab);
                    }
                    self.mark_current(Some(&tab.id));
                }
                TabClass::Recent => {
                    if !self.is_loaded(&tab.id) && !self.is_queued(&tab.id) {
                        self.queue.push_back(tab.id.clone());
                    }
                }
                TabClass::Stale => {
                    self.dequeue(&tab.id);
                    if self.is_loaded(&tab.id) {
                        self.unload(&tab.id);
                    }
                }
            }
        }

        if active_tab_id.is_none() {
            self.mark_current(None);
        }

        self.current_tabs = tabs.to_vec();

        if !self.queue.is_empty() && self.drain_deadline.is_none() {
            log::debug!("starting background load drain with {} queued", self.queue.len());
            self.drain_deadline = Some(now + self.drain_period);
        }
    }

    /// Runs one drain tick: loads the oldest queued tab if it still needs it.
    ///
    /// An empty queue stops the drain. Returns the id of the tab that was loaded.
    pub fn drain_tick(&mut self, now: Instant) -> Option<String> {
        let Some(next_id) = self.queue.pop_front() else {
            log::debug!("background load queue empty, stopping drain");
            self.drain_deadline = None;
            return None;
        };
        self.drain_deadline = Some(now + self.drain_period);

        if self.is_loaded(&next_id) {
            return None;
        }
        let tab = self.current_tabs.iter().find(|t| t.id == next_id)?.clone();
        log::debug!("background loading tab {}", tab.id);
        self.load(&tab);
        Some(next_id)
    }

    fn dequeue(&mut self, tab_id: &str) {
        self.queue.retain(|id| id != tab_id);
    }

    fn load(&mut self, tab: &Tab) {
        self.loaded.insert(tab.id.clone(), tab.url.clone());
        self.host.apply(FrameCommand::Load {
            tab_id: tab.id.clone(),
            url: tab.url.clone(),
        });
    }

    fn unload(&mut self, tab_id: &str) {
        if self.loaded.remove(tab_id).is_some() {
            if self.current.as_deref() == Some(tab_id) {
                self.current = None;
            }
            self.host.apply(FrameCommand::Unload {
                tab_id: tab_id.to_string(),
            });
        }
    }

    fn mark_current(&mut self, tab_id: Option<&str>) {
        if self.current.as_deref() == tab_id {
            return;
        }
        if let Some(previous) = self.current.take() {
            if self.is_loaded(&previous) {
                self.host.apply(FrameCommand::SetCurrent {
                    tab_id: previous,
                    current: false,
                });
            }
        }
        if let Some(id) = tab_id {
            self.current = Some(id.to_string());
            self.host.apply(FrameCommand::SetCurrent {
                tab_id: id.to_string(),
                current: true,
            });
        }
    }
}
