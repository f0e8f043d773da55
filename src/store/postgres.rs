//! Postgres-backed configuration store.
//!
//! Blobs live in a single `batch_configuration_blob` table:
//!
//! ```sql
//! CREATE TABLE batch_configuration_blob (
//!     blob_id    UUID PRIMARY KEY,
//!     content    BYTEA NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT now()
//! );
//! ```

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{BlobId, ConfigurationStore, StoreError};

/// Configuration store persisting blobs in PostgreSQL via SQLx.
#[derive(Debug, Clone)]
pub struct PostgresConfigurationStore {
    pool: PgPool,
}

impl PostgresConfigurationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigurationStore for PostgresConfigurationStore {
    async fn insert(&self, bytes: Vec<u8>) -> Result<BlobId, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO batch_configuration_blob (blob_id, content) VALUES ($1, $2)")
            .bind(id)
            .bind(&bytes)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn load(&self, id: BlobId) -> Result<Option<Vec<u8>>, StoreError> {
        let content: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT content FROM batch_configuration_blob WHERE blob_id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(content)
    }

    async fn delete(&self, id: BlobId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM batch_configuration_blob WHERE blob_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
