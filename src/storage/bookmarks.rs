use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use crate::feed::{Article, SavedArticle};

/// Result of [`BookmarkStore::toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkChange {
    Saved(SavedArticle),
    Removed(SavedArticle),
}

impl BookmarkChange {
    pub fn is_saved(&self) -> bool {
        matches!(self, BookmarkChange::Saved(_))
    }

    pub fn entry(&self) -> &SavedArticle {
        match self {
            BookmarkChange::Saved(s) | BookmarkChange::Removed(s) => s,
        }
    }
}

/// The user's saved articles, in the order they were saved.
///
/// Owns its collection outright: nothing outside this type mutates a
/// [`SavedArticle`], and a re-fetch of the feed never touches it.
#[derive(Debug, Clone, Default)]
pub struct BookmarkStore {
    entries: Vec<SavedArticle>,
    ids: HashSet<Arc<str>>,
}

impl BookmarkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from persisted entries. Later duplicates are dropped.
    pub fn from_saved(saved: Vec<SavedArticle>) -> Self {
        let mut store = Self::new();
        for entry in saved {
            if store.ids.insert(Arc::clone(&entry.article.id)) {
                store.entries.push(entry);
            }
        }
        store
    }

    /// Saves `article` stamped with the current time, or removes it if it is
    /// already saved.
    pub fn toggle(&mut self, article: &Article) -> BookmarkChange {
        self.toggle_at(article, Utc::now())
    }

    /// [`toggle`](Self::toggle) with an explicit timestamp.
    ///
    /// Two consecutive calls with the same article leave the list exactly as
    /// it was.
    pub fn toggle_at(&mut self, article: &Article, now: DateTime<Utc>) -> BookmarkChange {
        if let Some(removed) = self.remove(&article.id) {
            return BookmarkChange::Removed(removed);
        }
        let saved = SavedArticle {
            article: article.clone(),
            saved_at: now,
        };
        self.ids.insert(Arc::clone(&saved.article.id));
        self.entries.push(saved.clone());
        BookmarkChange::Saved(saved)
    }

    pub fn remove(&mut self, id: &str) -> Option<SavedArticle> {
        if !self.ids.remove(id) {
            return None;
        }
        let pos = self.entries.iter().position(|s| s.id() == id)?;
        Some(self.entries.remove(pos))
    }

    pub fn is_saved(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn list(&self) -> &[SavedArticle] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
