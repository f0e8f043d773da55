//! # Configuration Blob Store
//!
//! Persistence seam for serialized batch configurations. The lifetime of a
//! blob is the lifetime of its unit of work: creating the blob schedules the
//! work, deleting it is the single authoritative "this job is done" signal.
//!
//! Two implementations ship with the crate: [`InMemoryConfigurationStore`]
//! (DashMap-backed, used by tests and embedded setups) and, behind the
//! `postgres` feature, [`postgres::PostgresConfigurationStore`].

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryConfigurationStore;

/// Identifier of a persisted configuration blob.
pub type BlobId = Uuid;

/// Errors reported by a configuration store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend error: {message}")]
    Backend { message: String },
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend {
            message: err.to_string(),
        }
    }
}

/// Load/insert/delete of opaque configuration byte arrays.
///
/// Every job configuration blob is exclusively owned by one job; no two jobs
/// ever reference the same blob id.
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// Persist a new blob and return its identifier.
    async fn insert(&self, bytes: Vec<u8>) -> Result<BlobId, StoreError>;

    /// Load a blob, or `None` if it does not (or no longer does) exist.
    async fn load(&self, id: BlobId) -> Result<Option<Vec<u8>>, StoreError>;

    /// Delete a blob. Returns `false` if it was already gone.
    async fn delete(&self, id: BlobId) -> Result<bool, StoreError>;
}
