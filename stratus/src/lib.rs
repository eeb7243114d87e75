#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Engine configuration.
///
/// [`EngineConfig`] replaces ambient naming constants with an explicit
/// configuration object: partition names, the deploy target version, the
/// precache list, routing inputs, and the two independent API staleness
/// windows (read-time TTL and sweep-time eviction age).
pub mod config;

/// The engine itself: construction and event dispatch.
///
/// [`Engine`](engine::Engine) wires the injected storage and network
/// capabilities to the router, strategies, lifecycle, janitor, and client
/// channel, and exposes a single typed [`dispatch`](engine::Engine::dispatch)
/// surface for the hosting runtime's signals.
pub mod engine;

/// Error types for engine operations.
pub mod error;

/// Expired-entry eviction and precache refresh sweeps.
pub mod janitor;

/// The install/activate lifecycle state machine.
///
/// Install precaches the static partition all-or-nothing; activation purges
/// superseded partitions and advances the version registry. Failure leaves
/// the previously active worker in control.
pub mod lifecycle;

/// Best-effort notification channel to controlled clients, plus push
/// payload shaping.
pub mod messenger;

/// Background task offloading for cache revalidation.
///
/// Serving a cached response immediately and refreshing it afterwards
/// requires detached work. This module provides the
/// [`Offloader`](offload::Offloader) that spawns, deduplicates, and tracks
/// those tasks so a host can drain them before teardown.
pub mod offload;

/// The version registry mapping partition names to active versions.
pub mod registry;

/// The ordered strategy rule table.
pub mod router;

/// The three caching strategies.
pub mod strategy;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use engine::{Engine, EventOutcome, WorkerEvent};
pub use error::EngineError;
pub use janitor::{SweepKind, TtlJanitor};
pub use lifecycle::{LifecycleManager, WorkerState};
pub use messenger::{ClientMessage, ClientMessenger, NotificationAction, NotificationPayload};
pub use offload::Offloader;
pub use registry::VersionRegistry;
pub use router::{Route, RouteRule, StrategyKind, StrategyRouter};

pub use stratus_core::{
    CacheEntry, CacheKey, CachePartition, CacheStore, DeleteStatus, Fetch, FetchError,
    PartitionKey, Raw, RequestDescriptor, ResponseSnapshot, StorageError, StoreResult,
};
