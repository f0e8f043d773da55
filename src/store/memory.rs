//! In-memory configuration store backed by a concurrent map.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::{BlobId, ConfigurationStore, StoreError};

/// DashMap-backed store for tests and single-process embeddings.
#[derive(Debug, Default)]
pub struct InMemoryConfigurationStore {
    blobs: DashMap<BlobId, Vec<u8>>,
}

impl InMemoryConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live blobs, i.e. jobs that have not yet retired their
    /// configuration.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[async_trait]
impl ConfigurationStore for InMemoryConfigurationStore {
    async fn insert(&self, bytes: Vec<u8>) -> Result<BlobId, StoreError> {
        let id = Uuid::new_v4();
        self.blobs.insert(id, bytes);
        Ok(id)
    }

    async fn load(&self, id: BlobId) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.blobs.get(&id).map(|entry| entry.value().clone()))
    }

    async fn delete(&self, id: BlobId) -> Result<bool, StoreError> {
        Ok(self.blobs.remove(&id).is_some())
    }
}
