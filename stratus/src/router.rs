//! Strategy routing.
//!
//! A [`StrategyRouter`] holds an ordered rule table; the first rule whose
//! matcher accepts the request decides the strategy and target partition.
//! Two decisions sit outside the table and cannot be configured away:
//! non-GET requests always pass through without touching the cache, and a
//! request no rule matches passes through as well.

use http::Method;
use smol_str::SmolStr;
use stratus_core::RequestDescriptor;

use crate::config::EngineConfig;

/// Which caching algorithm a routed request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    /// Serve from cache, revalidate in the background, fetch on miss.
    CacheFirst,
    /// Fetch first; fall back to a TTL-fresh cached entry.
    NetworkFirstTtl,
    /// Fetch first; fall back to the offline document, then the root.
    NetworkFirstOffline,
}

/// Routing decision for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Run `kind` against the partition with logical name `partition`.
    Strategy {
        /// The strategy to execute.
        kind: StrategyKind,
        /// Logical name of the target partition.
        partition: SmolStr,
    },
    /// Forward to the network; never consult or populate the cache.
    Passthrough,
}

/// The request shapes a rule can match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMatch {
    /// Path starts with the given prefix.
    PathPrefix(String),
    /// A navigation (top-level document) request.
    Navigation,
    /// Exact origin match, `{scheme}://{authority}`.
    Origin(String),
    /// Exact host match, port ignored.
    Host(SmolStr),
}

impl RequestMatch {
    fn matches(&self, request: &RequestDescriptor) -> bool {
        match self {
            RequestMatch::PathPrefix(prefix) => request.path().starts_with(prefix.as_str()),
            RequestMatch::Navigation => request.is_navigation(),
            RequestMatch::Origin(origin) => {
                request.origin().as_deref() == Some(origin.as_str())
            }
            RequestMatch::Host(host) => request.host() == Some(host.as_str()),
        }
    }
}

/// One entry of the ordered rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    matcher: RequestMatch,
    kind: StrategyKind,
    partition: SmolStr,
}

impl RouteRule {
    /// Creates a rule mapping `matcher` to `kind` against `partition`.
    pub fn new(matcher: RequestMatch, kind: StrategyKind, partition: impl Into<SmolStr>) -> Self {
        Self {
            matcher,
            kind,
            partition: partition.into(),
        }
    }
}

/// Ordered, first-match-wins dispatch from request to strategy.
///
/// # Example
///
/// ```
/// use stratus::{EngineConfig, Route, StrategyKind, StrategyRouter};
/// use stratus_core::RequestDescriptor;
///
/// let config = EngineConfig::builder()
///     .worker_origin("https://app.example")
///     .build();
/// let router = StrategyRouter::from_config(&config);
///
/// let request = RequestDescriptor::get("https://app.example/api/health".parse().unwrap());
/// assert!(matches!(
///     router.route(&request),
///     Route::Strategy { kind: StrategyKind::NetworkFirstTtl, .. }
/// ));
/// ```
#[derive(Debug, Clone)]
pub struct StrategyRouter {
    rules: Vec<RouteRule>,
}

impl StrategyRouter {
    /// Creates a router over an explicit rule table.
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// Builds the standard rule table from configuration:
    ///
    /// 1. API prefix → network-first with TTL fallback, API partition
    /// 2. navigation → network-first with offline fallback, static partition
    /// 3. worker origin → cache-first, static partition
    /// 4. each configured asset host → cache-first, static partition
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut rules = vec![
            RouteRule::new(
                RequestMatch::PathPrefix(config.api_prefix.clone()),
                StrategyKind::NetworkFirstTtl,
                config.api_partition.clone(),
            ),
            RouteRule::new(
                RequestMatch::Navigation,
                StrategyKind::NetworkFirstOffline,
                config.static_partition.clone(),
            ),
            RouteRule::new(
                RequestMatch::Origin(config.worker_origin.clone()),
                StrategyKind::CacheFirst,
                config.static_partition.clone(),
            ),
        ];
        for host in &config.asset_hosts {
            rules.push(RouteRule::new(
                RequestMatch::Host(host.clone()),
                StrategyKind::CacheFirst,
                config.static_partition.clone(),
            ));
        }
        Self::new(rules)
    }

    /// Routes a request. Non-GET methods and unmatched requests pass
    /// through.
    pub fn route(&self, request: &RequestDescriptor) -> Route {
        if request.method() != Method::GET {
            return Route::Passthrough;
        }
        for rule in &self.rules {
            if rule.matcher.matches(request) {
                return Route::Strategy {
                    kind: rule.kind,
                    partition: rule.partition.clone(),
                };
            }
        }
        Route::Passthrough
    }
}
