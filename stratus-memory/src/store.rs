//! DashMap-backed store implementation.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use stratus_core::{
    CacheEntry, CacheKey, CachePartition, CacheStore, DeleteStatus, PartitionKey, StoreResult,
};

/// One open in-memory partition.
///
/// Entries live in a [`DashMap`] keyed by [`CacheKey`]; inserts replace the
/// prior value atomically.
#[derive(Debug, Default)]
pub struct MemoryPartition {
    entries: DashMap<CacheKey, CacheEntry>,
}

impl MemoryPartition {
    /// Returns the number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the partition holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CachePartition for MemoryPartition {
    async fn read(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        Ok(self.entries.get(key).map(|entry| entry.clone()))
    }

    async fn write(&self, key: CacheKey, entry: CacheEntry) -> StoreResult<()> {
        self.entries.insert(key, entry);
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> StoreResult<DeleteStatus> {
        match self.entries.remove(key) {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn keys(&self) -> StoreResult<Vec<CacheKey>> {
        Ok(self.entries.iter().map(|entry| entry.key().clone()).collect())
    }
}

/// In-memory cache store.
///
/// Partitions are created lazily on first [`open`](CacheStore::open) and
/// shared as `Arc` handles, so an open handle stays usable even while the
/// store is concurrently mutated. Deleting a partition detaches it from the
/// store; holders of a stale handle keep a private, disconnected map.
///
/// # Example
///
/// ```
/// use stratus_core::{CacheStore, PartitionKey};
/// use stratus_memory::MemoryStore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MemoryStore::new();
/// let partition = store.open(&PartitionKey::new("static", "v1")).await.unwrap();
/// assert!(partition.keys().await.unwrap().is_empty());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    partitions: Arc<DashMap<PartitionKey, Arc<MemoryPartition>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn open(&self, partition: &PartitionKey) -> StoreResult<Arc<dyn CachePartition>> {
        let partition = self
            .partitions
            .entry(partition.clone())
            .or_default()
            .value()
            .clone();
        Ok(partition)
    }

    async fn partitions(&self) -> StoreResult<Vec<PartitionKey>> {
        Ok(self.partitions.iter().map(|p| p.key().clone()).collect())
    }

    async fn delete_partition(&self, partition: &PartitionKey) -> StoreResult<DeleteStatus> {
        match self.partitions.remove(partition) {
            Some((_, dropped)) => Ok(DeleteStatus::Deleted(dropped.len() as u32)),
            None => Ok(DeleteStatus::Missing),
        }
    }
}
