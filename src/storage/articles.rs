use anyhow::Result;

use super::schema::Database;
use super::types::{Article, ArticleSummary};

/// Maximum rows returned by the article listing
const LIST_LIMIT: i64 = 50;

/// Maximum rows returned by a search query
const SEARCH_LIMIT: i64 = 20;

impl Database {
    // ========================================================================
    // Article Operations
    // ========================================================================

    /// Insert a saved article and return its row id.
    ///
    /// `created_at` is stamped by SQLite so it matches the database's clock,
    /// not the request handler's.
    pub async fn insert_article(
        &self,
        url: &str,
        title: &str,
        content: &str,
        hn_id: Option<i64>,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles (url, title, content, hn_id, created_at)
            VALUES (?, ?, ?, ?, datetime('now'))
        "#,
        )
        .bind(url)
        .bind(title)
        .bind(content)
        .bind(hn_id)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// List saved articles, newest first, filtered by archive state.
    pub async fn list_articles(&self, archived: bool) -> Result<Vec<ArticleSummary>> {
        let articles = sqlx::query_as::<_, ArticleSummary>(
            r#"
            SELECT id, title, url, created_at, is_archived
            FROM articles
            WHERE is_archived = ?
            ORDER BY created_at DESC
            LIMIT ?
        "#,
        )
        .bind(archived)
        .bind(LIST_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(articles)
    }

    /// Fetch a single article with its full content.
    pub async fn get_article(&self, article_id: i64) -> Result<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(
            r#"
            SELECT id, url, title, content, hn_id, created_at, is_archived
            FROM articles
            WHERE id = ?
        "#,
        )
        .bind(article_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }

    /// Search articles by title or content substring.
    pub async fn search_articles(&self, query: &str) -> Result<Vec<ArticleSummary>> {
        let pattern = format!("%{}%", query);
        let articles = sqlx::query_as::<_, ArticleSummary>(
            r#"
            SELECT id, title, url, created_at, is_archived
            FROM articles
            WHERE title LIKE ? OR content LIKE ?
            ORDER BY created_at DESC
            LIMIT ?
        "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(articles)
    }

    /// Set the archive flag. Returns false if no such article exists.
    pub async fn set_archived(&self, article_id: i64, archived: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE articles SET is_archived = ? WHERE id = ?")
            .bind(archived)
            .bind(article_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an article and its highlights.
    ///
    /// Children first, then the parent — two sequential statements, same
    /// ordering as feed deletion. If interrupted after the first statement
    /// the article survives with no highlights, and re-running the delete
    /// converges; the reverse order could leave orphaned highlight rows.
    pub async fn delete_article(&self, article_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM highlights WHERE article_id = ?")
            .bind(article_id)
            .execute(&self.pool)
            .await?;

        sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(article_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
