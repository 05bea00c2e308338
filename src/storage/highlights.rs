use anyhow::Result;

use super::schema::Database;
use super::types::{Highlight, HighlightWithTitle};

/// Maximum rows returned by the all-highlights listing
const ALL_HIGHLIGHTS_LIMIT: i64 = 100;

impl Database {
    // ========================================================================
    // Highlight Operations
    // ========================================================================

    /// Insert a highlight and return its row id.
    ///
    /// No uniqueness constraint on the quote text — saving the same quote
    /// twice produces two independently deletable rows.
    pub async fn insert_highlight(
        &self,
        article_id: i64,
        quote: &str,
        note: &str,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO highlights (article_id, quote, note, created_at)
            VALUES (?, ?, ?, datetime('now'))
        "#,
        )
        .bind(article_id)
        .bind(quote)
        .bind(note)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// List an article's highlights in creation order.
    pub async fn highlights_for_article(&self, article_id: i64) -> Result<Vec<Highlight>> {
        let highlights = sqlx::query_as::<_, Highlight>(
            r#"
            SELECT id, article_id, quote, note, created_at
            FROM highlights
            WHERE article_id = ?
            ORDER BY id ASC
        "#,
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(highlights)
    }

    /// List all highlights joined with their article titles, newest first.
    pub async fn all_highlights(&self) -> Result<Vec<HighlightWithTitle>> {
        let highlights = sqlx::query_as::<_, HighlightWithTitle>(
            r#"
            SELECT h.id, h.quote, h.note, h.created_at, h.article_id, a.title
            FROM highlights h
            JOIN articles a ON h.article_id = a.id
            ORDER BY h.created_at DESC
            LIMIT ?
        "#,
        )
        .bind(ALL_HIGHLIGHTS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(highlights)
    }

    /// Delete a single highlight.
    pub async fn delete_highlight(&self, highlight_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM highlights WHERE id = ?")
            .bind(highlight_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
