//! Engine configuration.
//!
//! All naming that the engine depends on — partition names, the deploy
//! version, routing inputs, staleness windows — arrives through
//! [`EngineConfig`] at construction. Nothing is read from process-wide
//! state.
//!
//! The two API staleness windows are deliberately independent:
//! `api_read_ttl` bounds how old a cached API response may be when served as
//! a network-failure fallback, while `api_sweep_max_age` bounds how old an
//! entry may grow before the eviction sweep removes it. The second is
//! typically much larger than the first.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

const DEFAULT_API_READ_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_API_SWEEP_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Configuration consumed by [`Engine`](crate::Engine) at construction.
///
/// # Example
///
/// ```
/// use stratus::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .worker_origin("https://app.example")
///     .target_version("v2.0.0")
///     .precache(["/", "/index.html", "/offline.html"])
///     .asset_host("fonts.googleapis.com")
///     .build();
/// assert_eq!(config.target_version, "v2.0.0");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Logical name of the precached static partition.
    #[serde(default = "default_static_partition")]
    pub static_partition: SmolStr,
    /// Logical name of the dynamic API partition.
    #[serde(default = "default_api_partition")]
    pub api_partition: SmolStr,
    /// The version this deploy installs and activates.
    pub target_version: SmolStr,
    /// Origin the worker is served from, `{scheme}://{authority}`.
    pub worker_origin: String,
    /// Path prefix that routes to the API strategy.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Third-party hosts whose assets are cached cache-first.
    #[serde(default)]
    pub asset_hosts: Vec<SmolStr>,
    /// Resources fetched and stored during install. Entries are absolute
    /// URLs or paths resolved against `worker_origin`.
    #[serde(default)]
    pub precache: Vec<String>,
    /// Path of the offline-fallback document, expected in the precache list.
    #[serde(default = "default_offline_path")]
    pub offline_path: String,
    /// Path of the root document, the last navigation fallback.
    #[serde(default = "default_root_path")]
    pub root_path: String,
    /// Maximum age at which a cached API response may be served when the
    /// network fails (e.g. "5m").
    #[serde(default = "default_api_read_ttl", with = "humantime_serde")]
    pub api_read_ttl: Duration,
    /// Maximum age an API entry may reach before the eviction sweep removes
    /// it (e.g. "1h"). Independent from `api_read_ttl`.
    #[serde(default = "default_api_sweep_max_age", with = "humantime_serde")]
    pub api_sweep_max_age: Duration,
}

fn default_static_partition() -> SmolStr {
    SmolStr::new_static("static")
}

fn default_api_partition() -> SmolStr {
    SmolStr::new_static("api")
}

fn default_api_prefix() -> String {
    "/api/".to_owned()
}

fn default_offline_path() -> String {
    "/offline.html".to_owned()
}

fn default_root_path() -> String {
    "/".to_owned()
}

fn default_api_read_ttl() -> Duration {
    DEFAULT_API_READ_TTL
}

fn default_api_sweep_max_age() -> Duration {
    DEFAULT_API_SWEEP_MAX_AGE
}

impl EngineConfig {
    /// Creates a new [`EngineConfigBuilder`].
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// The partition names this engine manages.
    pub fn managed_partitions(&self) -> [&SmolStr; 2] {
        [&self.static_partition, &self.api_partition]
    }

    /// Resolves a precache entry to an absolute URL: absolute entries pass
    /// through, paths are joined onto `worker_origin`.
    pub fn resolve_url(&self, entry: &str) -> String {
        if entry.contains("://") {
            entry.to_owned()
        } else {
            format!("{}{}", self.worker_origin, entry)
        }
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    static_partition: SmolStr,
    api_partition: SmolStr,
    target_version: SmolStr,
    worker_origin: String,
    api_prefix: String,
    asset_hosts: Vec<SmolStr>,
    precache: Vec<String>,
    offline_path: String,
    root_path: String,
    api_read_ttl: Duration,
    api_sweep_max_age: Duration,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self {
            static_partition: default_static_partition(),
            api_partition: default_api_partition(),
            target_version: SmolStr::new_static("v1"),
            worker_origin: String::new(),
            api_prefix: default_api_prefix(),
            asset_hosts: Vec::new(),
            precache: Vec::new(),
            offline_path: default_offline_path(),
            root_path: default_root_path(),
            api_read_ttl: DEFAULT_API_READ_TTL,
            api_sweep_max_age: DEFAULT_API_SWEEP_MAX_AGE,
        }
    }
}

impl EngineConfigBuilder {
    /// Sets the static partition name.
    pub fn static_partition(mut self, name: impl Into<SmolStr>) -> Self {
        self.static_partition = name.into();
        self
    }

    /// Sets the API partition name.
    pub fn api_partition(mut self, name: impl Into<SmolStr>) -> Self {
        self.api_partition = name.into();
        self
    }

    /// Sets the deploy target version.
    pub fn target_version(mut self, version: impl Into<SmolStr>) -> Self {
        self.target_version = version.into();
        self
    }

    /// Sets the worker origin.
    pub fn worker_origin(mut self, origin: impl Into<String>) -> Self {
        self.worker_origin = origin.into();
        self
    }

    /// Sets the API path prefix.
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Adds a third-party static-asset host.
    pub fn asset_host(mut self, host: impl Into<SmolStr>) -> Self {
        self.asset_hosts.push(host.into());
        self
    }

    /// Sets the precache list.
    pub fn precache<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.precache = entries.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the offline-fallback document path.
    pub fn offline_path(mut self, path: impl Into<String>) -> Self {
        self.offline_path = path.into();
        self
    }

    /// Sets the root document path.
    pub fn root_path(mut self, path: impl Into<String>) -> Self {
        self.root_path = path.into();
        self
    }

    /// Sets the read-time TTL for API fallback serving.
    pub fn api_read_ttl(mut self, ttl: Duration) -> Self {
        self.api_read_ttl = ttl;
        self
    }

    /// Sets the sweep-time eviction window for API entries.
    pub fn api_sweep_max_age(mut self, age: Duration) -> Self {
        self.api_sweep_max_age = age;
        self
    }

    /// Builds the [`EngineConfig`].
    pub fn build(self) -> EngineConfig {
        EngineConfig {
            static_partition: self.static_partition,
            api_partition: self.api_partition,
            target_version: self.target_version,
            worker_origin: self.worker_origin,
            api_prefix: self.api_prefix,
            asset_hosts: self.asset_hosts,
            precache: self.precache,
            offline_path: self.offline_path,
            root_path: self.root_path,
            api_read_ttl: self.api_read_ttl,
            api_sweep_max_age: self.api_sweep_max_age,
        }
    }
}
