use serde::Serialize;
use sqlx::FromRow;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of alcove appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Row Types
// ============================================================================

/// A saved article with its full cleaned content.
///
/// `content` is immutable after creation — there is no re-fetch path.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Article {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub content: String,
    pub hn_id: Option<i64>,
    pub created_at: String,
    pub is_archived: bool,
}

/// Article listing row — everything except the (potentially large) content.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub created_at: String,
    pub is_archived: bool,
}

/// A user highlight: a verbatim quote from an article plus an optional note.
///
/// Never updated after creation; duplicates of the same quote are allowed
/// and independently deletable.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Highlight {
    pub id: i64,
    pub article_id: i64,
    pub quote: String,
    pub note: String,
    pub created_at: String,
}

/// Highlight joined with its article's title, for the all-highlights view.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HighlightWithTitle {
    pub id: i64,
    pub quote: String,
    pub note: String,
    pub created_at: String,
    pub article_id: i64,
    pub title: String,
}

/// A feed subscription.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Feed {
    pub id: i64,
    pub url: String,
    pub title: String,
}

/// An unread feed item joined with its feed's title.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UnreadItem {
    pub id: i64,
    pub feed_id: i64,
    pub guid: String,
    pub title: String,
    pub url: String,
    pub pub_date: String,
    pub is_read: bool,
    pub feed_title: String,
}

/// A parsed feed item ready for insertion.
#[derive(Debug, Clone)]
pub struct NewFeedItem {
    pub guid: String,
    pub title: String,
    pub url: String,
    pub pub_date: String,
}
