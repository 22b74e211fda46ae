//! SQLite document store
//!
//! Every catalog record is one JSON body in the `documents` table, keyed by
//! collection and id. Tag counters live in their own table. A save reads the
//! stored body inside its transaction and applies the tag delta there, so the
//! counters follow what is actually committed.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{Pool, Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;

use super::models::{Collection, TagDelta, TagRegistry};
use super::repository::{ContentRepository, WriteBatch, WriteOp};
use crate::error::AppError;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
    /// Serializes batches so tag deltas are computed from the committed state
    write_lock: Mutex<()>,
}

impl Database {
    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        // Create connection string
        let connection_string = format!("sqlite:{}?mode=rwc", path.display());

        // Create connection pool
        let pool = SqlitePool::connect(&connection_string).await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }

    async fn apply_tag_delta(
        tx: &mut Transaction<'_, Sqlite>,
        delta: &TagDelta,
    ) -> Result<(), AppError> {
        for tag in &delta.added {
            sqlx::query(
                "INSERT INTO tags (tag, count) VALUES (?, 1) ON CONFLICT(tag) DO UPDATE SET count = count + 1",
            )
            .bind(tag)
            .execute(&mut **tx)
            .await?;
        }

        for tag in &delta.removed {
            sqlx::query("DELETE FROM tags WHERE tag = ? AND count <= 1")
                .bind(tag)
                .execute(&mut **tx)
                .await?;
            sqlx::query("UPDATE tags SET count = count - 1 WHERE tag = ?")
                .bind(tag)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }

    async fn stored_body(
        tx: &mut Transaction<'_, Sqlite>,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Value>, AppError> {
        let body = sqlx::query_scalar::<_, String>(
            "SELECT body FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        body.map(|body| serde_json::from_str(&body).map_err(AppError::from))
            .transpose()
    }
}

#[async_trait]
impl ContentRepository for Database {
    async fn list_documents(&self, collection: Collection) -> Result<Vec<Value>, AppError> {
        let bodies = sqlx::query_scalar::<_, String>(
            "SELECT body FROM documents WHERE collection = ? ORDER BY id ASC",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(AppError::from))
            .collect()
    }

    async fn get_document(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Value>, AppError> {
        let body = sqlx::query_scalar::<_, String>(
            "SELECT body FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        body.map(|body| serde_json::from_str(&body).map_err(AppError::from))
            .transpose()
    }

    async fn tag_registry(&self) -> Result<TagRegistry, AppError> {
        let rows = sqlx::query_as::<_, (String, i64)>("SELECT tag, count FROM tags ORDER BY tag")
            .fetch_all(&self.pool)
            .await?;

        Ok(TagRegistry(rows.into_iter().collect()))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().to_rfc3339();

        for op in &batch.ops {
            match op {
                WriteOp::Put {
                    collection,
                    id,
                    document,
                } => {
                    if collection.counts_tags() {
                        let previous = Self::stored_body(&mut tx, *collection, id).await?;
                        let delta = TagDelta::between_documents(previous.as_ref(), Some(document));
                        Self::apply_tag_delta(&mut tx, &delta).await?;
                    }

                    sqlx::query(
                        r#"
                        INSERT INTO documents (collection, id, body, updated_at)
                        VALUES (?, ?, ?, ?)
                        ON CONFLICT(collection, id) DO UPDATE SET
                            body = excluded.body,
                            updated_at = excluded.updated_at
                        "#,
                    )
                    .bind(collection.as_str())
                    .bind(id)
                    .bind(serde_json::to_string(document)?)
                    .bind(&now)
                    .execute(&mut *tx)
                    .await?;
                }
                WriteOp::Delete { collection, id } => {
                    let removed = sqlx::query_scalar::<_, String>(
                        "DELETE FROM documents WHERE collection = ? AND id = ? RETURNING body",
                    )
                    .bind(collection.as_str())
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;

                    if let Some(body) = removed.filter(|_| collection.counts_tags()) {
                        let removed: Value = serde_json::from_str(&body)?;
                        let delta = TagDelta::between_documents(Some(&removed), None);
                        Self::apply_tag_delta(&mut tx, &delta).await?;
                    }
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM documents WHERE collection != ?")
            .bind(Collection::Users.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tags").execute(&mut *tx).await?;
        tx.commit().await?;

        tracing::info!("Catalog cleared");
        Ok(())
    }
}
