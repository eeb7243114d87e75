//! The partitioned storage contract.
//!
//! Storage is addressed in two steps: a [`CacheStore`] opens named, versioned
//! [`CachePartition`]s, and partitions hold [`CacheEntry`]s keyed by
//! [`CacheKey`]. All operations are asynchronous and partition-scoped; no
//! cross-partition transactions exist or are needed.
//!
//! ## Versioned Partitions
//!
//! A partition's physical identity is `name@version` ([`PartitionKey`]).
//! Activation keeps exactly the partitions whose version matches the registry
//! and deletes the rest, so backends must support enumerating
//! ([`CacheStore::partitions`]) and dropping ([`CacheStore::delete_partition`])
//! whole partitions.
//!
//! ## Failure Semantics
//!
//! Backend failures surface as [`StorageError`]. Read paths treat them as a
//! cache miss; write paths during install treat them as fatal. Backends must
//! guarantee per-key atomicity: a concurrent reader sees either the previous
//! complete entry or the new complete entry, never a torn one.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use smol_str::SmolStr;

use crate::{CacheEntry, CacheKey, StorageError};

/// Result alias for storage operations.
pub type StoreResult<T> = Result<T, StorageError>;

/// Identity of a physical partition: a logical name plus an opaque version.
///
/// Displays as `name@version`, which is also the addressing format backends
/// are expected to use for any on-disk layout.
///
/// # Example
///
/// ```
/// use stratus_core::PartitionKey;
///
/// let key = PartitionKey::new("static", "v2.0.0");
/// assert_eq!(key.to_string(), "static@v2.0.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    name: SmolStr,
    version: SmolStr,
}

impl PartitionKey {
    /// Creates a partition key from a logical name and a version string.
    pub fn new(name: impl Into<SmolStr>, version: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Returns the logical partition name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the partition version.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// Outcome of a delete operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Number of deleted elements.
    Deleted(u32),
    /// Nothing existed under the key.
    Missing,
}

/// A handle to one open partition.
///
/// Handles are shared (`Arc`) and safe to use from concurrent tasks; writes
/// to the same key are last-writer-wins.
#[async_trait]
pub trait CachePartition: Send + Sync {
    /// Looks up the entry stored under `key`.
    async fn read(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>>;

    /// Stores `entry` under `key`, replacing any prior value.
    async fn write(&self, key: CacheKey, entry: CacheEntry) -> StoreResult<()>;

    /// Removes the entry stored under `key`.
    async fn remove(&self, key: &CacheKey) -> StoreResult<DeleteStatus>;

    /// Enumerates every key currently stored in this partition.
    async fn keys(&self) -> StoreResult<Vec<CacheKey>>;
}

/// A partitioned response store.
///
/// The single capability the engine requires from its storage environment.
/// `stratus-memory` provides the in-memory implementation; hosts with durable
/// storage implement this over their own backend.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Opens the partition addressed by `partition`, creating it if absent.
    async fn open(&self, partition: &PartitionKey) -> StoreResult<Arc<dyn CachePartition>>;

    /// Enumerates every existing partition.
    async fn partitions(&self) -> StoreResult<Vec<PartitionKey>>;

    /// Deletes an entire partition and everything in it.
    async fn delete_partition(&self, partition: &PartitionKey) -> StoreResult<DeleteStatus>;
}

#[async_trait]
impl CacheStore for Arc<dyn CacheStore> {
    async fn open(&self, partition: &PartitionKey) -> StoreResult<Arc<dyn CachePartition>> {
        (**self).open(partition).await
    }

    async fn partitions(&self) -> StoreResult<Vec<PartitionKey>> {
        (**self).partitions().await
    }

    async fn delete_partition(&self, partition: &PartitionKey) -> StoreResult<DeleteStatus> {
        (**self).delete_partition(partition).await
    }
}

#[async_trait]
impl CacheStore for Box<dyn CacheStore> {
    async fn open(&self, partition: &PartitionKey) -> StoreResult<Arc<dyn CachePartition>> {
        (**self).open(partition).await
    }

    async fn partitions(&self) -> StoreResult<Vec<PartitionKey>> {
        (**self).partitions().await
    }

    async fn delete_partition(&self, partition: &PartitionKey) -> StoreResult<DeleteStatus> {
        (**self).delete_partition(partition).await
    }
}
