//! Engine construction and event dispatch.

use std::sync::Arc;

use http::Uri;
use smol_str::SmolStr;
use stratus_core::{
    CacheKey, CacheStore, Fetch, PartitionKey, Raw, RequestDescriptor, ResponseSnapshot,
};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::janitor::{SweepKind, TtlJanitor};
use crate::lifecycle::{LifecycleManager, WorkerState};
use crate::messenger::{ClientMessage, ClientMessenger, NotificationPayload};
use crate::offload::Offloader;
use crate::registry::VersionRegistry;
use crate::router::{Route, StrategyKind, StrategyRouter};
use crate::strategy;

/// A lifecycle or runtime signal from the hosting environment.
///
/// Events are the engine's entire input surface; each maps to exactly one
/// handler through [`Engine::dispatch`].
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// Precache `precache` at `target_version` and become ready to take
    /// over.
    Install {
        /// The version this deploy installs.
        target_version: SmolStr,
        /// Absolute URLs or worker-origin paths to precache.
        precache: Vec<String>,
    },
    /// Purge superseded partitions and take control of all clients.
    Activate,
    /// An intercepted request to resolve to a response.
    Fetch(RequestDescriptor),
    /// A tagged maintenance sweep signal.
    Sweep {
        /// The host's sweep tag.
        tag: SmolStr,
    },
    /// An opaque push payload to shape and republish to clients.
    Message {
        /// Raw payload bytes, expected to be JSON.
        payload: Raw,
    },
}

impl WorkerEvent {
    /// Builds the install event for a configuration's own target version and
    /// precache list.
    pub fn install_from(config: &EngineConfig) -> Self {
        WorkerEvent::Install {
            target_version: config.target_version.clone(),
            precache: config.precache.clone(),
        }
    }
}

/// What a dispatched event produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// A response for an intercepted request.
    Response(ResponseSnapshot),
    /// Install ran to completion; the worker is ready to activate.
    Installed,
    /// Activation ran to completion; the worker controls all clients.
    Activated,
    /// A sweep ran; `affected` entries were evicted or refreshed.
    Swept {
        /// Entries the sweep touched.
        affected: u32,
    },
    /// The event carried an unknown tag and was deliberately ignored.
    Ignored,
    /// A shaped message was posted to clients.
    Posted,
}

/// The request-interception caching engine.
///
/// Wires the injected [`CacheStore`] and [`Fetch`] capabilities to the
/// strategy router, the lifecycle state machine, the maintenance sweeps, and
/// the client channel. One engine instance corresponds to one worker
/// instance; all state is local to it and the storage backend.
///
/// # Completion contract
///
/// When [`dispatch`](Engine::dispatch) returns, the event's own work is
/// done — install and activate are never detached. The single exception is
/// the background revalidation a cache-first hit leaves behind, which is
/// abandonable by design; hosts that want a clean teardown call
/// [`drain_background`](Engine::drain_background) first.
pub struct Engine {
    config: Arc<EngineConfig>,
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetch>,
    registry: VersionRegistry,
    router: StrategyRouter,
    lifecycle: LifecycleManager,
    janitor: TtlJanitor,
    offloader: Offloader,
    messenger: ClientMessenger,
    offline_key: CacheKey,
    root_key: CacheKey,
}

impl Engine {
    /// Creates an engine over the given configuration and capabilities.
    ///
    /// Fails when the configured origin and document paths do not combine
    /// into valid absolute URLs.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetch>,
    ) -> Result<Self, EngineError> {
        let config = Arc::new(config);
        let offline_key = document_key(&config, &config.offline_path)?;
        let root_key = document_key(&config, &config.root_path)?;

        let registry = VersionRegistry::new();
        let messenger = ClientMessenger::new();
        let router = StrategyRouter::from_config(&config);
        let lifecycle = LifecycleManager::new(
            Arc::clone(&config),
            Arc::clone(&store),
            Arc::clone(&fetcher),
            registry.clone(),
            messenger.clone(),
        );
        let janitor = TtlJanitor::new(
            Arc::clone(&config),
            Arc::clone(&store),
            Arc::clone(&fetcher),
            registry.clone(),
        );

        Ok(Self {
            config,
            store,
            fetcher,
            registry,
            router,
            lifecycle,
            janitor,
            offloader: Offloader::new(),
            messenger,
            offline_key,
            root_key,
        })
    }

    /// Dispatches one hosting-runtime event to its handler.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventOutcome, EngineError> {
        match event {
            WorkerEvent::Install {
                target_version,
                precache,
            } => self
                .lifecycle
                .install(&target_version, &precache)
                .await
                .map(|()| EventOutcome::Installed),
            WorkerEvent::Activate => self
                .lifecycle
                .activate()
                .await
                .map(|()| EventOutcome::Activated),
            WorkerEvent::Fetch(request) => {
                self.handle_fetch(request).await.map(EventOutcome::Response)
            }
            WorkerEvent::Sweep { tag } => match SweepKind::from_tag(&tag) {
                Some(SweepKind::ExpiredEntries) => Ok(EventOutcome::Swept {
                    affected: self.janitor.sweep_expired().await,
                }),
                Some(SweepKind::RefreshPrecache) => Ok(EventOutcome::Swept {
                    affected: self.janitor.refresh_precache().await,
                }),
                None => {
                    debug!(%tag, "ignoring unknown sweep tag");
                    Ok(EventOutcome::Ignored)
                }
            },
            WorkerEvent::Message { payload } => {
                let payload = NotificationPayload::from_json(&payload);
                self.messenger
                    .post_to_all(ClientMessage::Notification { payload });
                Ok(EventOutcome::Posted)
            }
        }
    }

    /// Resolves an intercepted request to a response.
    ///
    /// Routes the request, opens the target partition at its active version
    /// (or the configured target version before first activation), and runs
    /// the selected strategy. Always resolves: the result is a response or
    /// an explicit error, never an open wait.
    pub async fn handle_fetch(
        &self,
        request: RequestDescriptor,
    ) -> Result<ResponseSnapshot, EngineError> {
        match self.router.route(&request) {
            Route::Passthrough => {
                debug!(uri = %request.uri(), method = %request.method(), "passing through");
                self.fetcher.fetch(&request).await.map_err(EngineError::from)
            }
            Route::Strategy { kind, partition } => {
                let version = self
                    .registry
                    .active_version(&partition)
                    .unwrap_or_else(|| self.config.target_version.clone());
                let partition_key = PartitionKey::new(partition, version);
                let handle = match self.store.open(&partition_key).await {
                    Ok(handle) => handle,
                    Err(err) => {
                        warn!(partition = %partition_key, error = %err, "store unavailable, passing through");
                        return self.fetcher.fetch(&request).await.map_err(EngineError::from);
                    }
                };
                match kind {
                    StrategyKind::CacheFirst => {
                        strategy::cache_first(
                            handle,
                            Arc::clone(&self.fetcher),
                            &self.offloader,
                            &self.offline_key,
                            &request,
                        )
                        .await
                    }
                    StrategyKind::NetworkFirstTtl => {
                        strategy::network_first_ttl(
                            handle,
                            Arc::clone(&self.fetcher),
                            self.config.api_read_ttl,
                            &request,
                        )
                        .await
                    }
                    StrategyKind::NetworkFirstOffline => {
                        strategy::network_first_offline(
                            handle,
                            Arc::clone(&self.fetcher),
                            &self.offline_key,
                            &self.root_key,
                            &request,
                        )
                        .await
                    }
                }
            }
        }
    }

    /// Returns the current lifecycle state.
    pub async fn state(&self) -> WorkerState {
        self.lifecycle.state().await
    }

    /// Subscribes to the client notification channel.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ClientMessage> {
        self.messenger.subscribe()
    }

    /// The version registry, mapping partition names to active versions.
    pub fn registry(&self) -> &VersionRegistry {
        &self.registry
    }

    /// Awaits every detached background task currently in flight.
    pub async fn drain_background(&self) {
        self.offloader.wait_idle().await;
    }
}

fn document_key(config: &EngineConfig, path: &str) -> Result<CacheKey, EngineError> {
    let url = config.resolve_url(path);
    let uri: Uri = url
        .parse()
        .map_err(|_| EngineError::Config(format!("document path does not form a url: {url}")))?;
    Ok(CacheKey::from_uri(&uri))
}
