//! The three caching strategies.
//!
//! Each strategy is a pure algorithm over an open partition handle and the
//! injected [`Fetch`] capability. They share three rules:
//!
//! - only 2xx responses are ever written to a partition;
//! - a storage failure on a read path degrades to a cache miss;
//! - a storage failure on a write path after a successful fetch is logged
//!   and swallowed — the response already in hand is still returned.
//!
//! Every path resolves to a concrete response or an
//! [`EngineError::Network`]; nothing here leaves the caller waiting.

use std::sync::Arc;
use std::time::Duration;

use stratus_core::{
    CacheEntry, CacheKey, CachePartition, Fetch, RequestDescriptor, ResponseSnapshot,
};
use tracing::{debug, warn};

use crate::error::EngineError;
use crate::offload::Offloader;

/// Serve from cache when possible; refresh in the background.
///
/// On a hit the stored response is returned immediately and a detached
/// revalidation fetch is offloaded; the caller never waits for it. On a miss
/// the fetch happens in the foreground. A failed foreground fetch falls back
/// to the offline document, but only for navigation requests — plain assets
/// propagate the failure.
pub async fn cache_first(
    partition: Arc<dyn CachePartition>,
    fetcher: Arc<dyn Fetch>,
    offloader: &Offloader,
    offline_key: &CacheKey,
    request: &RequestDescriptor,
) -> Result<ResponseSnapshot, EngineError> {
    let key = request.cache_key();
    match partition.read(&key).await {
        Ok(Some(entry)) => {
            debug!(%key, "cache hit, revalidating in background");
            revalidate(
                Arc::clone(&partition),
                fetcher,
                offloader,
                key,
                request.clone(),
            );
            return Ok(entry.into_snapshot());
        }
        Ok(None) => {}
        Err(err) => warn!(%key, error = %err, "cache read failed, treating as miss"),
    }

    match fetcher.fetch(request).await {
        Ok(snapshot) => {
            if snapshot.is_success() {
                write_through(&*partition, key, &snapshot).await;
            }
            Ok(snapshot)
        }
        Err(err) => {
            if request.is_navigation()
                && let Ok(Some(entry)) = partition.read(offline_key).await
            {
                debug!(%key, "network failed, serving offline document");
                return Ok(entry.into_snapshot());
            }
            Err(EngineError::Network(err))
        }
    }
}

/// Fetch first; fall back to a TTL-fresh cached response.
///
/// A successful fetch is stored with the current timestamp, refreshing the
/// entry's TTL. On network failure the cached entry is served only while its
/// age is within `ttl` — an expired entry is treated exactly like a miss and
/// the network failure propagates.
pub async fn network_first_ttl(
    partition: Arc<dyn CachePartition>,
    fetcher: Arc<dyn Fetch>,
    ttl: Duration,
    request: &RequestDescriptor,
) -> Result<ResponseSnapshot, EngineError> {
    let key = request.cache_key();
    match fetcher.fetch(request).await {
        Ok(snapshot) => {
            if snapshot.is_success() {
                write_through(&*partition, key, &snapshot).await;
            }
            Ok(snapshot)
        }
        Err(err) => match partition.read(&key).await {
            Ok(Some(entry)) if entry.is_fresh(ttl) => {
                debug!(%key, "network failed, serving TTL-fresh cached response");
                Ok(entry.into_snapshot())
            }
            Ok(Some(_)) => {
                debug!(%key, "cached response expired, propagating network failure");
                Err(EngineError::Network(err))
            }
            Ok(None) => Err(EngineError::Network(err)),
            Err(storage) => {
                warn!(%key, error = %storage, "cache read failed during fallback");
                Err(EngineError::Network(err))
            }
        },
    }
}

/// Fetch first; fall back to the offline document, then the root document.
///
/// The navigation strategy. When both the network and every fallback lookup
/// come up empty the network failure propagates, so document requests still
/// resolve to an explicit error rather than hanging.
pub async fn network_first_offline(
    partition: Arc<dyn CachePartition>,
    fetcher: Arc<dyn Fetch>,
    offline_key: &CacheKey,
    root_key: &CacheKey,
    request: &RequestDescriptor,
) -> Result<ResponseSnapshot, EngineError> {
    let key = request.cache_key();
    match fetcher.fetch(request).await {
        Ok(snapshot) => {
            if snapshot.is_success() {
                write_through(&*partition, key, &snapshot).await;
            }
            Ok(snapshot)
        }
        Err(err) => {
            for fallback in [offline_key, root_key] {
                match partition.read(fallback).await {
                    Ok(Some(entry)) => {
                        debug!(%key, %fallback, "network failed, serving fallback document");
                        return Ok(entry.into_snapshot());
                    }
                    Ok(None) => {}
                    Err(storage) => {
                        warn!(%fallback, error = %storage, "fallback read failed")
                    }
                }
            }
            Err(EngineError::Network(err))
        }
    }
}

/// Spawns the detached revalidation for a served cache hit.
///
/// Deduplicated by key through the offloader; abandoning the task is safe.
fn revalidate(
    partition: Arc<dyn CachePartition>,
    fetcher: Arc<dyn Fetch>,
    offloader: &Offloader,
    key: CacheKey,
    request: RequestDescriptor,
) {
    offloader.spawn(key.clone(), async move {
        match fetcher.fetch(&request).await {
            Ok(snapshot) if snapshot.is_success() => {
                write_through(&*partition, key.clone(), &snapshot).await;
                debug!(%key, "background revalidation refreshed entry");
            }
            Ok(snapshot) => {
                debug!(%key, status = %snapshot.status(), "revalidation response not cacheable")
            }
            Err(err) => debug!(%key, error = %err, "background revalidation failed"),
        }
    });
}

/// Writes a snapshot under `key`, logging and swallowing storage failures.
async fn write_through(partition: &dyn CachePartition, key: CacheKey, snapshot: &ResponseSnapshot) {
    let entry = CacheEntry::new(snapshot.clone());
    if let Err(err) = partition.write(key, entry).await {
        warn!(error = %err, "cache write failed, response still served");
    }
}
