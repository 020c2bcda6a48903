use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use thiserror::Error;

use crate::feed::{Article, SavedArticle};

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of newsdash appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Maps lock-related sqlx errors to [`DatabaseError::InstanceLocked`].
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY, SQLITE_LOCKED and SQLITE_CANTOPEN, by message.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}

// ============================================================================
// Row Types
// ============================================================================

/// One row of `saved_articles`. Timestamps are Unix milliseconds.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct SavedArticleRow {
    pub article_id: String,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
    pub source_name: String,
    pub published_at: Option<i64>,
    pub trending: bool,
    pub saved_at: i64,
}

impl SavedArticleRow {
    pub fn from_saved(saved: &SavedArticle) -> Self {
        let a = &saved.article;
        Self {
            article_id: a.id.to_string(),
            title: a.title.to_string(),
            description: a.description.to_string(),
            content: a.content.as_deref().map(str::to_string),
            url: a.url.to_string(),
            image_url: a.image_url.as_deref().map(str::to_string),
            source_name: a.source_name.to_string(),
            published_at: a.published_at.map(|t| t.timestamp_millis()),
            trending: a.trending,
            saved_at: saved.saved_at.timestamp_millis(),
        }
    }

    /// Rebuilds the saved article. A corrupt `saved_at` falls back to the epoch.
    pub fn into_saved(self) -> SavedArticle {
        SavedArticle {
            article: Article {
                id: Arc::from(self.article_id),
                title: Arc::from(self.title),
                description: Arc::from(self.description),
                content: self.content.map(Arc::from),
                url: Arc::from(self.url),
                image_url: self.image_url.map(Arc::from),
                source_name: Arc::from(self.source_name),
                published_at: self.published_at.and_then(DateTime::<Utc>::from_timestamp_millis),
                trending: self.trending,
            },
            saved_at: DateTime::<Utc>::from_timestamp_millis(self.saved_at).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::article::test_support::article;
    use chrono::TimeZone;

    #[test]
    fn test_lock_messages_detected() {
        assert!(is_lock_message("error returned from database: database is locked"));
        assert!(is_lock_message("(code: 14) unable to open database file"));
        assert!(!is_lock_message("no such table: saved_articles"));
    }

    #[test]
    fn test_row_round_trip_keeps_millisecond_times() {
        let published = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let saved = SavedArticle {
            article: article("https://example.com/a", "Reuters", Some(published)),
            saved_at: Utc.timestamp_millis_opt(1_717_000_000_123).unwrap(),
        };
        assert_eq!(SavedArticleRow::from_saved(&saved).into_saved(), saved);
    }
}
