//! Background task offloading.
//!
//! Cache-first serving returns a stored response immediately and refreshes
//! the entry afterwards; that refresh runs detached from the request that
//! triggered it. The [`Offloader`] owns this detached work: tasks are
//! spawned onto the runtime, tracked by cache key, and deduplicated — a
//! revalidation requested while one for the same key is in flight is
//! skipped.
//!
//! Detached work is abandonable by contract: nothing the engine promises
//! depends on a revalidation completing. Hosts that want a clean teardown
//! can still [`wait_idle`](Offloader::wait_idle) to drain everything in
//! flight.

use std::sync::Arc;

use dashmap::DashMap;
use std::future::Future;
use stratus_core::CacheKey;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Default)]
struct OffloaderInner {
    tasks: DashMap<CacheKey, JoinHandle<()>>,
}

/// Spawns, deduplicates, and tracks detached background tasks.
///
/// Clones share the same task registry.
#[derive(Debug, Clone, Default)]
pub struct Offloader {
    inner: Arc<OffloaderInner>,
}

impl Offloader {
    /// Creates an offloader with no tasks in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` keyed by `key`.
    ///
    /// Returns `false` without spawning when a task for the same key is
    /// still in flight.
    pub fn spawn<F>(&self, key: CacheKey, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.inner.tasks.contains_key(&key) {
            debug!(%key, "background task already in flight, skipping");
            return false;
        }
        let inner = Arc::clone(&self.inner);
        let cleanup_key = key.clone();
        let handle = tokio::spawn(async move {
            task.await;
            inner.tasks.remove(&cleanup_key);
        });
        self.inner.tasks.insert(key, handle);
        true
    }

    /// Number of tasks currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inner.tasks.len()
    }

    /// Waits until every tracked task has completed.
    ///
    /// Tasks spawned while draining are drained too.
    pub async fn wait_idle(&self) {
        loop {
            let keys: Vec<CacheKey> = self
                .inner
                .tasks
                .iter()
                .map(|entry| entry.key().clone())
                .collect();
            if keys.is_empty() {
                return;
            }
            for key in keys {
                if let Some((_, handle)) = self.inner.tasks.remove(&key) {
                    let _ = handle.await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn key(path: &str) -> CacheKey {
        CacheKey::from_uri(&format!("https://app.example{path}").parse().unwrap())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn deduplicates_in_flight_keys() {
        let offloader = Offloader::new();
        let ran = Arc::new(AtomicUsize::new(0));

        let first = {
            let ran = Arc::clone(&ran);
            offloader.spawn(key("/a"), async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                ran.fetch_add(1, Ordering::SeqCst);
            })
        };
        let second = {
            let ran = Arc::clone(&ran);
            offloader.spawn(key("/a"), async move {
                ran.fetch_add(1, Ordering::SeqCst);
            })
        };

        assert!(first);
        assert!(!second);
        offloader.wait_idle().await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(offloader.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn distinct_keys_run_independently() {
        let offloader = Offloader::new();
        let ran = Arc::new(AtomicUsize::new(0));

        for path in ["/a", "/b", "/c"] {
            let ran = Arc::clone(&ran);
            assert!(offloader.spawn(key(path), async move {
                ran.fetch_add(1, Ordering::SeqCst);
            }));
        }

        offloader.wait_idle().await;
        assert_eq!(ran.load(Ordering::SeqCst), 3);
    }
}
