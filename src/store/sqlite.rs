use async_trait::async_trait;
use sqlx::SqlitePool;

use super::KeyValueStore;
use crate::error::AppError;

/// `kv_store` table in SQLite, created by the bundled migrations.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Wraps the pool and applies pending migrations.
    pub async fn new(pool: SqlitePool) -> Result<Self, AppError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to write key {}: {:?}", key, e);
            AppError::from(e)
        })?;
        Ok(())
    }

    async fn insert_if_absent(&self, key: &str, value: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT INTO kv_store (key, value) VALUES (?, ?) ON CONFLICT(key) DO NOTHING",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove(&self, key: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, AppError> {
        // substr() instead of LIKE so '%' and '_' in ids need no escaping.
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT key, value FROM kv_store WHERE substr(key, 1, length(?)) = ? ORDER BY key",
        )
        .bind(prefix)
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
