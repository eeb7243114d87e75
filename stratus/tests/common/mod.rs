//! Shared test fixtures: a scriptable fetcher and engine wiring.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use stratus::{Engine, EngineConfig, EventOutcome, WorkerEvent};
use stratus_core::{Fetch, FetchError, RequestDescriptor, ResponseSnapshot};
use stratus_memory::MemoryStore;

/// A scriptable network: URL → response, per-URL delays, and a global
/// offline switch.
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: DashMap<String, ResponseSnapshot>,
    delays: DashMap<String, Duration>,
    offline: AtomicBool,
    fetch_counts: DashMap<String, usize>,
    total: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serves a `200 OK` text body for `url`.
    pub fn respond(&self, url: &str, body: &'static str) {
        self.responses
            .insert(url.to_owned(), ResponseSnapshot::ok(body.into()));
    }

    /// Serves an arbitrary status for `url`.
    pub fn respond_status(&self, url: &str, status: u16, body: &'static str) {
        let status = http::StatusCode::from_u16(status).unwrap();
        self.responses.insert(
            url.to_owned(),
            ResponseSnapshot::new(status, http::HeaderMap::new(), body.into()),
        );
    }

    /// Makes `url` unreachable again.
    pub fn remove(&self, url: &str) {
        self.responses.remove(url);
    }

    /// Delays every fetch of `url`, for racing background work.
    pub fn delay(&self, url: &str, delay: Duration) {
        self.delays.insert(url.to_owned(), delay);
    }

    /// Fails every fetch while set, regardless of scripted responses.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn fetches_of(&self, url: &str) -> usize {
        self.fetch_counts.get(url).map(|count| *count).unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseSnapshot, FetchError> {
        let url = request.uri().to_string();
        self.total.fetch_add(1, Ordering::SeqCst);
        *self.fetch_counts.entry(url.clone()).or_insert(0) += 1;

        // The outcome is fixed at issue time; a delay only postpones
        // delivery, which is what racing tests need.
        let outcome = if self.offline.load(Ordering::SeqCst) {
            Err(FetchError::Unreachable("network down".to_owned()))
        } else {
            match self.responses.get(&url) {
                Some(snapshot) => Ok(snapshot.clone()),
                None => Err(FetchError::Unreachable(format!("no route to {url}"))),
            }
        };
        let delay = self.delays.get(&url).map(|d| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

pub const ORIGIN: &str = "https://app.example";
pub const VERSION: &str = "v2.0.0";
pub const FONT_CSS: &str = "https://fonts.googleapis.com/css2?family=Inter";

/// The standard test configuration: three documents, one asset, one font.
pub fn test_config() -> EngineConfig {
    EngineConfig::builder()
        .worker_origin(ORIGIN)
        .target_version(VERSION)
        .precache(["/", "/offline.html", "/app.css", FONT_CSS])
        .asset_host("fonts.googleapis.com")
        .asset_host("fonts.gstatic.com")
        .build()
}

/// Scripts responses for every entry of [`test_config`]'s precache list.
pub fn script_precache(fetcher: &MockFetcher) {
    fetcher.respond(&format!("{ORIGIN}/"), "<home>");
    fetcher.respond(&format!("{ORIGIN}/offline.html"), "<offline>");
    fetcher.respond(&format!("{ORIGIN}/app.css"), "body{}");
    fetcher.respond(FONT_CSS, "@font-face{}");
}

/// Builds an engine over a fresh store and fetcher, already installed and
/// activated at [`VERSION`].
pub async fn active_engine() -> (Arc<MemoryStore>, Arc<MockFetcher>, Engine) {
    let store = Arc::new(MemoryStore::new());
    let fetcher = MockFetcher::new();
    script_precache(&fetcher);

    let config = test_config();
    let engine = Engine::new(config.clone(), store.clone(), fetcher.clone()).unwrap();
    assert_eq!(
        engine
            .dispatch(WorkerEvent::install_from(&config))
            .await
            .unwrap(),
        EventOutcome::Installed
    );
    assert_eq!(
        engine.dispatch(WorkerEvent::Activate).await.unwrap(),
        EventOutcome::Activated
    );
    (store, fetcher, engine)
}

/// GET descriptor for an absolute URL.
pub fn get(url: &str) -> RequestDescriptor {
    RequestDescriptor::get(url.parse().unwrap())
}
