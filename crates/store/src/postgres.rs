use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;

use crate::{Collection, DocumentStore, Result, StoreError};

/// PostgreSQL-backed document store.
///
/// Every collection lives in one `documents` table keyed by
/// `(collection, id)` with a JSONB body.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        let body: Option<Value> =
            sqlx::query_scalar("SELECT body FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(body)
    }

    async fn put(&self, collection: Collection, id: &str, value: Value) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (collection, id)
            DO UPDATE SET body = EXCLUDED.body, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert(&self, collection: Collection, id: &str, value: Value) -> Result<()> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (collection, id) DO NOTHING
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Err(StoreError::Conflict {
                collection,
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>> {
        let bodies: Vec<Value> = sqlx::query_scalar(
            "SELECT body FROM documents WHERE collection = $1 AND body -> $2 = $3 ORDER BY id",
        )
        .bind(collection.as_str())
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;
        Ok(bodies)
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Value>> {
        let bodies: Vec<Value> =
            sqlx::query_scalar("SELECT body FROM documents WHERE collection = $1 ORDER BY id")
                .bind(collection.as_str())
                .fetch_all(&self.pool)
                .await?;
        Ok(bodies)
    }

    async fn clear(&self, collection: Collection) -> Result<()> {
        sqlx::query("DELETE FROM documents WHERE collection = $1")
            .bind(collection.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
