//! Bookmark Manager for SideTabs.
//!
//! Implements `BookmarkManagerTrait`: a url-keyed list of saved conversations
//! persisted as one JSON value in the local storage area. Every mutation writes
//! the full list and then hands the full list to subscribers.

use std::sync::Arc;

use crate::database::{StorageArea, BOOKMARKS_KEY};
use crate::managers::subscribers::{SubscriptionId, Subscribers};
use crate::services::clock::now_millis;
use crate::types::bookmark::Bookmark;
use crate::types::errors::StorageError;

/// Callback receiving the complete bookmark list after every change.
pub type BookmarkListener = dyn FnMut(&[Bookmark]) + Send;

/// Trait defining bookmark management operations.
pub trait BookmarkManagerTrait {
    fn init(&mut self) -> Result<(), StorageError>;
    fn subscribe(&mut self, listener: Box<BookmarkListener>) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
    fn get_bookmarks(&self) -> &[Bookmark];
    fn is_bookmarked(&self, url: &str) -> bool;
    /// Returns false if the url was already bookmarked.
    fn add(&mut self, title: &str, url: &str) -> Result<bool, StorageError>;
    /// Returns false if the url was not bookmarked.
    fn remove(&mut self, url: &str) -> Result<bool, StorageError>;
    /// Adds or removes the bookmark; returns whether the url is bookmarked afterwards.
    fn toggle(&mut self, title: &str, url: &str) -> Result<bool, StorageError>;
    fn update(&mut self, url: &str, title: &str) -> Result<(), StorageError>;
    fn mark_broken(&mut self, url: &str, broken: bool) -> Result<(), StorageError>;
    fn clear_broken_flags(&mut self) -> Result<(), StorageError>;
}

/// Bookmark manager holding the list in memory and writing through a storage area.
pub struct BookmarkManager {
    bookmarks: Vec<Bookmark>,
    listeners: Subscribers<BookmarkListener>,
    storage: Arc<dyn StorageArea>,
}

impl BookmarkManager {
    pub fn new(storage: Arc<dyn StorageArea>) -> Self {
        Self {
            bookmarks: Vec::new(),
            listeners: Subscribers::new(),
            storage,
        }
    }

    fn find_index(&self, url: &str) -> Option<usize> {
        self.bookmarks.iter().position(|b| b.url == url)
    }

    pub fn get_bookmark(&self, url: &str) -> Option<&Bookmark> {
        self.bookmarks.iter().find(|b| b.url == url)
    }

    fn notify(&mut self) {
        for listener in self.listeners.iter_mut() {
            listener(&self.bookmarks);
        }
    }

    /// Writes the list, then notifies regardless of the outcome so views
    /// always mirror the in-memory state.
    fn save(&mut self) -> Result<(), StorageError> {
        let result = serde_json::to_value(&self.bookmarks)
            .map_err(StorageError::from)
            .and_then(|value| self.storage.set(BOOKMARKS_KEY, value));
        self.notify();
        result
    }
}

impl BookmarkManagerTrait for BookmarkManager {
    /// Loads the stored list. On failure the manager starts empty.
    fn init(&mut self) -> Result<(), StorageError> {
        let loaded = match self.storage.get(BOOKMARKS_KEY) {
            Ok(Some(value)) => serde_json::from_value::<Vec<Bookmark>>(value).map_err(StorageError::from),
            Ok(None) => Ok(Vec::new()),
            Err(e) => Err(e),
        };

        let result = match loaded {
            Ok(bookmarks) => {
                self.bookmarks = bookmarks;
                Ok(())
            }
            Err(e) => {
                self.bookmarks.clear();
                Err(e)
            }
        };
        self.notify();
        result
    }

    fn subscribe(&mut self, listener: Box<BookmarkListener>) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    fn get_bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    fn is_bookmarked(&self, url: &str) -> bool {
        self.find_index(url).is_some()
    }

    fn add(&mut self, title: &str, url: &str) -> Result<bool, StorageError> {
        if self.is_bookmarked(url) {
            return Ok(false);
        }
        self.bookmarks.push(Bookmark {
            title: title.to_string(),
            url: url.to_string(),
            added_at: now_millis(),
            broken: false,
        });
        self.save()?;
        Ok(true)
    }

    fn remove(&mut self, url: &str) -> Result<bool, StorageError> {
        let Some(index) = self.find_index(url) else {
            return Ok(false);
        };
        self.bookmarks.remove(index);
        self.save()?;
        Ok(true)
    }

    fn toggle(&mut self, title: &str, url: &str) -> Result<bool, StorageError> {
        if self.is_bookmarked(url) {
            self.remove(url)?;
            Ok(false)
        } else {
            self.add(title, url)?;
            Ok(true)
        }
    }

    /// Renames a bookmark. Unknown urls are ignored.
    fn update(&mut self, url: &str, title: &str) -> Result<(), StorageError> {
        let Some(index) = self.find_index(url) else {
            return Ok(());
        };
        self.bookmarks[index].title = title.to_string();
        self.save()
    }

    /// Sets the broken flag, writing only when it actually changes.
    fn mark_broken(&mut self, url: &str, broken: bool) -> Result<(), StorageError> {
        let Some(index) = self.find_index(url) else {
            return Ok(());
        };
        if self.bookmarks[index].broken == broken {
            return Ok(());
        }
        self.bookmarks[index].broken = broken;
        self.save()
    }

    fn clear_broken_flags(&mut self) -> Result<(), StorageError> {
        let mut changed = false;
        for bookmark in self.bookmarks.iter_mut().filter(|b| b.broken) {
            bookmark.broken = false;
            changed = true;
        }
        if changed {
            self.save()?;
        }
        Ok(())
    }
}
