//! The network capability boundary.
//!
//! The engine never talks to the network directly; the hosting environment
//! injects a [`Fetch`] implementation. The boundary has no retry policy —
//! retries, if any, belong to the strategy issuing the fetch.

use async_trait::async_trait;
use thiserror::Error;

use crate::{RequestDescriptor, ResponseSnapshot};

/// Error type for failed fetch attempts.
///
/// A `FetchError` is recoverable: strategies react to it by walking their
/// fallback chain (cached entry, offline document) and only propagate it once
/// the chain is exhausted.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The upstream could not be reached (offline, DNS failure, refused).
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// The fetch did not complete in time.
    #[error("fetch timed out")]
    Timeout,

    /// Any other transport-level failure.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Trait for fetching a request from the network.
///
/// Implementations resolve a [`RequestDescriptor`] to a fully-buffered
/// [`ResponseSnapshot`] or a [`FetchError`]. Non-2xx responses are *not*
/// errors at this boundary; they are snapshots the caller inspects.
///
/// # Examples
///
/// ```rust,ignore
/// struct HostFetcher { client: HttpClient }
///
/// #[async_trait]
/// impl Fetch for HostFetcher {
///     async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, FetchError> {
///         self.client.execute(request).await
///     }
/// }
/// ```
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches the request from the upstream network.
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, FetchError>;
}
