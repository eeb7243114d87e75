//! The install/activate lifecycle state machine.
//!
//! A worker moves `New → Installing → Installed → Activating → Active`;
//! `InstallFailed` is terminal. Install is all-or-nothing: every precache
//! resource must fetch and store successfully, otherwise the partial target
//! partition is rolled back and the candidate is discarded — the previously
//! active worker, if any, keeps serving. Activation purges every partition
//! whose version was superseded and advances the version registry before
//! taking control of clients.

use std::sync::Arc;

use http::Uri;
use smol_str::SmolStr;
use stratus_core::{CacheEntry, CacheStore, Fetch, PartitionKey, RequestDescriptor};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::messenger::{ClientMessage, ClientMessenger};
use crate::registry::VersionRegistry;

/// Lifecycle states of one worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Created; no install attempted yet.
    New,
    /// Precaching the target version.
    Installing,
    /// Precache complete; ready to supersede the active worker immediately.
    Installed,
    /// Purging superseded partitions and claiming clients.
    Activating,
    /// Controlling all clients and serving requests.
    Active,
    /// Terminal: a precache resource failed; this candidate never activates.
    InstallFailed,
}

#[derive(Debug)]
struct LifecycleInner {
    state: WorkerState,
    installed_version: Option<SmolStr>,
}

/// Runs install and activate against the store and version registry.
pub struct LifecycleManager {
    inner: RwLock<LifecycleInner>,
    config: Arc<EngineConfig>,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetch>,
    registry: VersionRegistry,
    messenger: ClientMessenger,
}

impl LifecycleManager {
    pub(crate) fn new(
        config: Arc<EngineConfig>,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetch>,
        registry: VersionRegistry,
        messenger: ClientMessenger,
    ) -> Self {
        Self {
            inner: RwLock::new(LifecycleInner {
                state: WorkerState::New,
                installed_version: None,
            }),
            config,
            store,
            fetcher,
            registry,
            messenger,
        }
    }

    /// Returns the current lifecycle state.
    pub async fn state(&self) -> WorkerState {
        self.inner.read().await.state
    }

    /// Precaches `precache` into the static partition at `target_version`,
    /// all-or-nothing.
    ///
    /// On success the worker is `Installed` and ready to be activated
    /// immediately, without waiting for existing clients to close. On any
    /// failure the partial target partition is deleted, the state becomes
    /// `InstallFailed`, clients are notified, and the error propagates. The
    /// version registry is never advanced here.
    pub async fn install(
        &self,
        target_version: &str,
        precache: &[String],
    ) -> Result<(), EngineError> {
        {
            let mut inner = self.inner.write().await;
            if inner.state != WorkerState::New {
                return Err(EngineError::Lifecycle {
                    from: inner.state,
                    to: WorkerState::Installing,
                });
            }
            inner.state = WorkerState::Installing;
        }

        let target = PartitionKey::new(self.config.static_partition.clone(), target_version);
        match self.precache_all(&target, precache).await {
            Ok(()) => {
                debug!(partition = %target, entries = precache.len(), "install complete");
                let mut inner = self.inner.write().await;
                inner.state = WorkerState::Installed;
                inner.installed_version = Some(SmolStr::new(target_version));
                Ok(())
            }
            Err(err) => {
                // No partial precache may survive a failed install.
                if let Err(purge) = self.store.delete_partition(&target).await {
                    warn!(partition = %target, error = %purge, "rollback of partial precache failed");
                }
                self.inner.write().await.state = WorkerState::InstallFailed;
                self.messenger
                    .post_to_all(ClientMessage::worker_error(err.to_string()));
                Err(err)
            }
        }
    }

    async fn precache_all(
        &self,
        target: &PartitionKey,
        precache: &[String],
    ) -> Result<(), EngineError> {
        let partition = self
            .store
            .open(target)
            .await
            .map_err(|err| install_failure(target.to_string(), err))?;

        for entry in precache {
            let url = self.config.resolve_url(entry);
            let uri: Uri = url
                .parse()
                .map_err(|err| install_failure(url.clone(), err))?;
            let request = RequestDescriptor::get(uri);
            let snapshot = self
                .fetcher
                .fetch(&request)
                .await
                .map_err(|err| install_failure(url.clone(), err))?;
            if !snapshot.is_success() {
                return Err(install_failure(
                    url,
                    std::io::Error::other(format!(
                        "precache fetch returned status {}",
                        snapshot.status()
                    )),
                ));
            }
            partition
                .write(request.cache_key(), CacheEntry::new(snapshot))
                .await
                .map_err(|err| install_failure(url.clone(), err))?;
        }
        Ok(())
    }

    /// Purges superseded partitions, advances the version registry for every
    /// managed partition name, and takes control of all clients.
    ///
    /// Only valid after a successful install. A storage failure mid-purge
    /// leaves the worker in `Activating`; re-dispatching the activate event
    /// resumes the purge, so a completed activation always leaves exactly
    /// the target-version partitions behind.
    pub async fn activate(&self) -> Result<(), EngineError> {
        let target = {
            let mut inner = self.inner.write().await;
            if !matches!(
                inner.state,
                WorkerState::Installed | WorkerState::Activating
            ) {
                return Err(EngineError::Lifecycle {
                    from: inner.state,
                    to: WorkerState::Activating,
                });
            }
            let Some(target) = inner.installed_version.clone() else {
                return Err(EngineError::Lifecycle {
                    from: inner.state,
                    to: WorkerState::Activating,
                });
            };
            inner.state = WorkerState::Activating;
            target
        };

        for partition in self.store.partitions().await? {
            if partition.version() != target.as_str() {
                let status = self.store.delete_partition(&partition).await?;
                debug!(partition = %partition, ?status, "purged superseded partition");
            }
        }

        for name in self.config.managed_partitions() {
            self.registry.set_active(name.clone(), target.clone());
        }

        self.inner.write().await.state = WorkerState::Active;
        debug!(version = %target, "activation complete, controlling all clients");
        self.messenger.post_to_all(ClientMessage::worker_ready());
        Ok(())
    }
}

fn install_failure(
    resource: String,
    source: impl std::error::Error + Send + Sync + 'static,
) -> EngineError {
    EngineError::Install {
        url: resource,
        source: Box::new(source),
    }
}
