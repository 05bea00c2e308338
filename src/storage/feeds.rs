use anyhow::Result;

use super::schema::Database;
use super::types::{Feed, NewFeedItem, UnreadItem};

/// Maximum rows returned by the unread-items listing
const UNREAD_LIMIT: i64 = 100;

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Insert a feed subscription and return its row id.
    ///
    /// The url column is UNIQUE; subscribing twice surfaces the constraint
    /// violation to the caller rather than silently updating.
    pub async fn insert_feed(&self, url: &str, title: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO feeds (url, title) VALUES (?, ?)")
            .bind(url)
            .bind(title)
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// List all feed subscriptions, alphabetical by title.
    pub async fn list_feeds(&self) -> Result<Vec<Feed>> {
        let feeds = sqlx::query_as::<_, Feed>(
            "SELECT id, url, title FROM feeds ORDER BY title ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(feeds)
    }

    /// Delete a feed and its items.
    ///
    /// Two sequential statements, items first, deliberately not wrapped in a
    /// transaction. If the process dies between them the feed row survives
    /// with zero items and the next delete converges; the reverse order
    /// could leave orphaned items with no parent feed.
    pub async fn delete_feed(&self, feed_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM feed_items WHERE feed_id = ?")
            .bind(feed_id)
            .execute(&self.pool)
            .await?;

        sqlx::query("DELETE FROM feeds WHERE id = ?")
            .bind(feed_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ========================================================================
    // Feed Item Operations
    // ========================================================================

    /// Insert feed items, ignoring ones already present.
    ///
    /// Duplicate suppression is the explicit `INSERT OR IGNORE` against the
    /// `UNIQUE(feed_id, guid)` constraint, so re-fetching a feed (or two
    /// refreshes racing) never duplicates rows. Returns the number of rows
    /// actually inserted. An individual item's failure is logged and skipped
    /// — it never aborts the rest of the batch.
    pub async fn insert_feed_items(&self, feed_id: i64, items: &[NewFeedItem]) -> Result<usize> {
        let mut inserted = 0;

        for item in items {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO feed_items (feed_id, guid, title, url, pub_date)
                VALUES (?, ?, ?, ?, ?)
            "#,
            )
            .bind(feed_id)
            .bind(&item.guid)
            .bind(&item.title)
            .bind(&item.url)
            .bind(&item.pub_date)
            .execute(&self.pool)
            .await;

            match result {
                Ok(r) if r.rows_affected() > 0 => inserted += 1,
                Ok(_) => {} // duplicate guid, ignored
                Err(e) => {
                    tracing::debug!(feed_id = feed_id, guid = %item.guid, error = %e, "Skipping feed item insert");
                }
            }
        }

        Ok(inserted)
    }

    /// List unread items across all feeds, newest first, with feed titles.
    pub async fn unread_items(&self) -> Result<Vec<UnreadItem>> {
        let items = sqlx::query_as::<_, UnreadItem>(
            r#"
            SELECT i.id, i.feed_id, i.guid, i.title, i.url, i.pub_date, i.is_read,
                   f.title AS feed_title
            FROM feed_items i
            JOIN feeds f ON i.feed_id = f.id
            WHERE i.is_read = 0
            ORDER BY i.pub_date DESC
            LIMIT ?
        "#,
        )
        .bind(UNREAD_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Mark a feed item as read.
    pub async fn mark_item_read(&self, item_id: i64) -> Result<()> {
        sqlx::query("UPDATE feed_items SET is_read = 1 WHERE id = ?")
            .bind(item_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Count items belonging to a feed. Used by tests to verify the
    /// delete ordering invariant.
    pub async fn count_feed_items(&self, feed_id: i64) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM feed_items WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0)
    }
}
