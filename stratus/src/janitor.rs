//! Cache maintenance sweeps.
//!
//! Sweeps arrive as tagged signals from the hosting runtime. The tag maps to
//! a [`SweepKind`] through an explicit table; unknown tags map to nothing
//! and the caller ignores them.
//!
//! Both sweeps are best-effort. The expired-entry sweep is not
//! correctness-critical: the read-time TTL check in the API strategy already
//! refuses to serve stale data even if a sweep never runs. Its eviction
//! window is therefore configured independently of — and typically much
//! larger than — the read-time TTL.

use std::sync::Arc;

use http::Uri;
use stratus_core::{CacheEntry, CacheStore, Fetch, RequestDescriptor};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::registry::VersionRegistry;

/// The maintenance work a sweep tag requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepKind {
    /// Evict API entries older than the sweep window.
    ExpiredEntries,
    /// Re-fetch and overwrite the precached static resources.
    RefreshPrecache,
}

impl SweepKind {
    /// Maps a runtime sweep tag to its kind. Unknown tags map to `None`.
    pub fn from_tag(tag: &str) -> Option<SweepKind> {
        match tag {
            "background-sync" => Some(SweepKind::ExpiredEntries),
            "cache-update" => Some(SweepKind::RefreshPrecache),
            _ => None,
        }
    }
}

/// Runs maintenance sweeps over the active partitions.
pub struct TtlJanitor {
    config: Arc<EngineConfig>,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetch>,
    registry: VersionRegistry,
}

impl TtlJanitor {
    pub(crate) fn new(
        config: Arc<EngineConfig>,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetch>,
        registry: VersionRegistry,
    ) -> Self {
        Self {
            config,
            store,
            fetcher,
            registry,
        }
    }

    /// Deletes every entry in the active API partition whose age exceeds the
    /// sweep window. Returns the number of evicted entries.
    ///
    /// Skips silently when no API partition is active yet; individual
    /// read/delete failures are logged and do not stop the sweep.
    pub async fn sweep_expired(&self) -> u32 {
        let Some(partition_key) = self.registry.active_partition(&self.config.api_partition)
        else {
            debug!("no active api partition, nothing to sweep");
            return 0;
        };
        let partition = match self.store.open(&partition_key).await {
            Ok(partition) => partition,
            Err(err) => {
                warn!(partition = %partition_key, error = %err, "sweep could not open partition");
                return 0;
            }
        };
        let keys = match partition.keys().await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(partition = %partition_key, error = %err, "sweep could not list keys");
                return 0;
            }
        };

        let mut evicted = 0;
        for key in keys {
            match partition.read(&key).await {
                Ok(Some(entry)) if !entry.is_fresh(self.config.api_sweep_max_age) => {
                    match partition.remove(&key).await {
                        Ok(_) => {
                            evicted += 1;
                            debug!(%key, "evicted expired entry");
                        }
                        Err(err) => warn!(%key, error = %err, "eviction failed"),
                    }
                }
                Ok(_) => {}
                Err(err) => warn!(%key, error = %err, "sweep read failed"),
            }
        }
        debug!(partition = %partition_key, evicted, "expired-entry sweep complete");
        evicted
    }

    /// Re-fetches every precache URL and overwrites its entry in the active
    /// static partition. Returns the number of refreshed entries.
    ///
    /// Best-effort per URL: a failed or non-2xx fetch keeps the previously
    /// cached copy.
    pub async fn refresh_precache(&self) -> u32 {
        let Some(partition_key) = self.registry.active_partition(&self.config.static_partition)
        else {
            debug!("no active static partition, nothing to refresh");
            return 0;
        };
        let partition = match self.store.open(&partition_key).await {
            Ok(partition) => partition,
            Err(err) => {
                warn!(partition = %partition_key, error = %err, "refresh could not open partition");
                return 0;
            }
        };

        let mut refreshed = 0;
        for resource in &self.config.precache {
            let url = self.config.resolve_url(resource);
            let Ok(uri) = url.parse::<Uri>() else {
                warn!(%url, "skipping unparseable precache url");
                continue;
            };
            let request = RequestDescriptor::get(uri);
            match self.fetcher.fetch(&request).await {
                Ok(snapshot) if snapshot.is_success() => {
                    let entry = CacheEntry::new(snapshot);
                    match partition.write(request.cache_key(), entry).await {
                        Ok(()) => refreshed += 1,
                        Err(err) => warn!(%url, error = %err, "refresh write failed"),
                    }
                }
                Ok(snapshot) => {
                    debug!(%url, status = %snapshot.status(), "refresh skipped, keeping cached copy")
                }
                Err(err) => debug!(%url, error = %err, "refresh fetch failed, keeping cached copy"),
            }
        }
        debug!(partition = %partition_key, refreshed, "precache refresh complete");
        refreshed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_dispatch_has_explicit_default() {
        assert_eq!(
            SweepKind::from_tag("background-sync"),
            Some(SweepKind::ExpiredEntries)
        );
        assert_eq!(
            SweepKind::from_tag("cache-update"),
            Some(SweepKind::RefreshPrecache)
        );
        assert_eq!(SweepKind::from_tag("periodic-gc"), None);
    }
}
