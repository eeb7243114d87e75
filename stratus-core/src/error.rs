//! Error types for storage operations.

use thiserror::Error;

/// Error type for storage backend operations.
///
/// Callers on read paths treat any `StorageError` as a cache miss; write
/// paths during install propagate it as an install failure, and write paths
/// elsewhere log and swallow it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store is unreachable or refused the operation.
    #[error("storage backend unavailable")]
    Unavailable,

    /// Internal backend error, state or computation error.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}
