//! Content storage for SQLite.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{ContentItem, NewContent};

/// Store for shared content and its view records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Health check - verify database connectivity.
    async fn health_check(&self) -> Result<bool>;

    /// Insert a new item under a freshly generated public id.
    async fn create(&self, content: NewContent) -> Result<ContentItem>;

    /// Get an item by public id, only if it has not been deleted.
    async fn get_active(&self, public_id: &str) -> Result<Option<ContentItem>>;

    /// Get an item by public id, tombstoned or not.
    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<ContentItem>>;

    /// Tombstone an item (returns true if this call flipped the flag).
    async fn mark_deleted(&self, id: i64) -> Result<bool>;

    /// Start the auto-delete timer if it has not started yet.
    /// Returns the stored start time, which is `at` only for the first caller.
    async fn set_first_viewed(&self, id: i64, at: i64) -> Result<i64>;

    /// Record that `ip` viewed the item (returns false if it already had).
    async fn record_view(&self, content_id: i64, ip: &str, at: i64) -> Result<bool>;

    /// Remove the view record for `ip`, giving it its view back.
    async fn forget_view(&self, content_id: i64, ip: &str) -> Result<()>;

    /// Whether `ip` has already viewed the item.
    async fn has_viewed(&self, content_id: i64, ip: &str) -> Result<bool>;

    /// Live auto-delete items whose timer is running.
    async fn list_timer_started(&self) -> Result<Vec<ContentItem>>;
}

/// SQLite implementation of ContentStore.
#[derive(Clone)]
pub struct SqliteContentStore {
    pool: SqlitePool,
}

impl SqliteContentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for SqliteContentStore {
    async fn health_check(&self) -> Result<bool> {
        let result: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(result == 1)
    }

    async fn create(&self, content: NewContent) -> Result<ContentItem> {
        let public_id = Uuid::new_v4().to_string();

        let item = sqlx::query_as::<_, ContentItem>(
            r#"
            INSERT INTO contents (
                public_id, kind, content, file_path, file_name, auto_delete,
                delete_after_minutes, burn_after_read, ip_restriction, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&public_id)
        .bind(content.kind.as_str())
        .bind(&content.content)
        .bind(&content.file_path)
        .bind(&content.file_name)
        .bind(content.auto_delete)
        .bind(content.delete_after_minutes.max(1))
        .bind(content.burn_after_read)
        .bind(content.ip_restriction)
        .bind(content.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(item)
    }

    async fn get_active(&self, public_id: &str) -> Result<Option<ContentItem>> {
        let item = sqlx::query_as::<_, ContentItem>(
            "SELECT * FROM contents WHERE public_id = ? AND deleted = 0",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    async fn find_by_public_id(&self, public_id: &str) -> Result<Option<ContentItem>> {
        let item = sqlx::query_as::<_, ContentItem>("SELECT * FROM contents WHERE public_id = ?")
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    async fn mark_deleted(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE contents SET deleted = 1 WHERE id = ? AND deleted = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_first_viewed(&self, id: i64, at: i64) -> Result<i64> {
        // COALESCE keeps an existing value, so concurrent first views agree on one start time.
        let stored: Option<Option<i64>> = sqlx::query_scalar(
            r#"
            UPDATE contents
            SET first_viewed_at = COALESCE(first_viewed_at, ?)
            WHERE id = ?
            RETURNING first_viewed_at
            "#,
        )
        .bind(at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        stored
            .flatten()
            .ok_or_else(|| anyhow!("content {id} vanished while starting its timer"))
    }

    async fn record_view(&self, content_id: i64, ip: &str, at: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO content_views (content_id, ip_address, viewed_at)
            VALUES (?, ?, ?)
            ON CONFLICT (content_id, ip_address) DO NOTHING
            "#,
        )
        .bind(content_id)
        .bind(ip)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn forget_view(&self, content_id: i64, ip: &str) -> Result<()> {
        sqlx::query("DELETE FROM content_views WHERE content_id = ? AND ip_address = ?")
            .bind(content_id)
            .bind(ip)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn has_viewed(&self, content_id: i64, ip: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM content_views WHERE content_id = ? AND ip_address = ?)",
        )
        .bind(content_id)
        .bind(ip)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn list_timer_started(&self) -> Result<Vec<ContentItem>> {
        let items = sqlx::query_as::<_, ContentItem>(
            r#"
            SELECT * FROM contents
            WHERE deleted = 0 AND auto_delete = 1 AND first_viewed_at IS NOT NULL
            ORDER BY first_viewed_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }
}
