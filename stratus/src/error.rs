//! Error types for engine operations.

use stratus_core::{FetchError, StorageError};
use thiserror::Error;

use crate::lifecycle::WorkerState;

/// Error type for engine operations.
///
/// Two of these are fatal to their operation: `Install` discards the
/// candidate worker, and `Lifecycle` rejects an out-of-order transition.
/// `Network` is the end of a strategy's fallback chain; `Storage` surfaces
/// only from paths where a backend failure may not be masked (install writes,
/// activation purges).
///
/// A cache miss is never an error — read paths represent it as `None` and
/// fall through to the network.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A precache fetch or write failed during install. The install attempt
    /// is abandoned and any partial precache is rolled back.
    #[error("install failed at {url}")]
    Install {
        /// The precache URL that failed.
        url: String,
        /// The underlying fetch or storage failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A fetch failed and the strategy's fallback chain was exhausted.
    #[error(transparent)]
    Network(#[from] FetchError),

    /// A storage failure on a path where it may not be masked.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The configuration is unusable (e.g. an origin that does not parse
    /// into absolute document URLs).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An event arrived in a state that does not permit it.
    #[error("invalid lifecycle transition from {from:?} to {to:?}")]
    Lifecycle {
        /// The state the worker was in.
        from: WorkerState,
        /// The state the event tried to reach.
        to: WorkerState,
    },
}
