use super::schema::Database;
use super::types::{DatabaseError, SavedArticleRow};
use crate::feed::SavedArticle;

/// Upper bound on rows loaded at startup.
const MAX_SAVED_ARTICLES: i64 = 5000;

impl Database {
    // ========================================================================
    // Saved Article Operations
    // ========================================================================

    /// All saved articles in the order they were saved.
    pub async fn load_saved_articles(&self) -> Result<Vec<SavedArticle>, DatabaseError> {
        let rows: Vec<SavedArticleRow> = sqlx::query_as(
            r#"
            SELECT article_id, title, description, content, url, image_url,
                   source_name, published_at, trending, saved_at
            FROM saved_articles
            ORDER BY position ASC
            LIMIT ?
        "#,
        )
        .bind(MAX_SAVED_ARTICLES)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(SavedArticleRow::into_saved).collect())
    }

    /// Stores `saved`, replacing any row with the same article id.
    ///
    /// A replaced row moves to the end of the saved order.
    pub async fn insert_saved_article(&self, saved: &SavedArticle) -> Result<(), DatabaseError> {
        let row = SavedArticleRow::from_saved(saved);
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO saved_articles
                (article_id, title, description, content, url, image_url,
                 source_name, published_at, trending, saved_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(&row.article_id)
        .bind(&row.title)
        .bind(&row.description)
        .bind(&row.content)
        .bind(&row.url)
        .bind(&row.image_url)
        .bind(&row.source_name)
        .bind(row.published_at)
        .bind(row.trending)
        .bind(row.saved_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Removes the saved article with `article_id`. Returns whether a row existed.
    pub async fn delete_saved_article(&self, article_id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM saved_articles WHERE article_id = ?")
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
