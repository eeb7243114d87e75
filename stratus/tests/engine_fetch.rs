//! Request handling through the router and strategies.

mod common;

use std::time::Duration;

use chrono::Utc;
use common::{FONT_CSS, ORIGIN, active_engine, get};
use http::{HeaderMap, Method};
use stratus::{EngineError, EventOutcome, WorkerEvent};
use stratus_core::{
    CacheEntry, CachePartition, CacheStore, PartitionKey, RequestDescriptor, ResponseSnapshot,
};

#[tokio::test(flavor = "multi_thread")]
async fn precached_asset_serves_from_store_without_waiting_on_network() {
    let (_store, fetcher, engine) = active_engine().await;

    // The network now has a newer copy; the served bytes must still be the
    // stored ones until revalidation lands.
    fetcher.respond(&format!("{ORIGIN}/app.css"), "body{color:red}");
    fetcher.delay(&format!("{ORIGIN}/app.css"), Duration::from_millis(50));

    let response = engine
        .handle_fetch(get(&format!("{ORIGIN}/app.css")))
        .await
        .unwrap();
    assert_eq!(response.body().as_ref(), b"body{}");

    // After the background revalidation drains, the fresh copy is served.
    engine.drain_background().await;
    let response = engine
        .handle_fetch(get(&format!("{ORIGIN}/app.css")))
        .await
        .unwrap();
    assert_eq!(response.body().as_ref(), b"body{color:red}");
}

#[tokio::test(flavor = "multi_thread")]
async fn asset_host_request_serves_the_precached_copy() {
    let (_store, fetcher, engine) = active_engine().await;

    // The CDN now serves newer bytes; the first response must still be the
    // precached copy, refreshed only by the detached revalidation.
    fetcher.respond(FONT_CSS, "@font-face{v2}");
    let response = engine.handle_fetch(get(FONT_CSS)).await.unwrap();
    assert_eq!(response.body().as_ref(), b"@font-face{}");

    engine.drain_background().await;
    let response = engine.handle_fetch(get(FONT_CSS)).await.unwrap();
    assert_eq!(response.body().as_ref(), b"@font-face{v2}");
}

#[tokio::test]
async fn non_get_bypasses_cache_entirely() {
    let (store, fetcher, engine) = active_engine().await;
    let url = format!("{ORIGIN}/api/generate");
    fetcher.respond(&url, "created");

    let request = RequestDescriptor::new(Method::POST, url.parse().unwrap(), HeaderMap::new());
    let response = engine.handle_fetch(request).await.unwrap();
    assert_eq!(response.body().as_ref(), b"created");

    // The request key appears in no partition.
    let key = get(&url).cache_key();
    for partition_key in store.partitions().await.unwrap() {
        let partition = store.open(&partition_key).await.unwrap();
        assert!(partition.read(&key).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn api_request_refreshes_cache_on_success() {
    let (store, fetcher, engine) = active_engine().await;
    let url = format!("{ORIGIN}/api/health");
    fetcher.respond(&url, r#"{"status":"ok"}"#);

    let response = engine.handle_fetch(get(&url)).await.unwrap();
    assert_eq!(response.body().as_ref(), br#"{"status":"ok"}"#);

    let partition = store
        .open(&PartitionKey::new("api", common::VERSION))
        .await
        .unwrap();
    let entry = partition.read(&get(&url).cache_key()).await.unwrap().unwrap();
    assert_eq!(entry.snapshot().body().as_ref(), br#"{"status":"ok"}"#);
}

#[tokio::test]
async fn api_fallback_honors_read_ttl() {
    let (store, fetcher, engine) = active_engine().await;
    let url = format!("{ORIGIN}/api/health");
    fetcher.respond(&url, r#"{"status":"ok"}"#);
    engine.handle_fetch(get(&url)).await.unwrap();

    // Network gone, entry fresh: served from cache.
    fetcher.set_offline(true);
    let response = engine.handle_fetch(get(&url)).await.unwrap();
    assert_eq!(response.body().as_ref(), br#"{"status":"ok"}"#);

    // Back-date the entry past the read TTL: treated as a miss.
    let partition = store
        .open(&PartitionKey::new("api", common::VERSION))
        .await
        .unwrap();
    let key = get(&url).cache_key();
    let entry = partition.read(&key).await.unwrap().unwrap();
    let expired = CacheEntry::stored_at(
        entry.snapshot().clone(),
        Utc::now() - chrono::Duration::seconds(301),
    );
    partition.write(key, expired).await.unwrap();

    let err = engine.handle_fetch(get(&url)).await.unwrap_err();
    assert!(matches!(err, EngineError::Network(_)));
}

#[tokio::test]
async fn navigation_falls_back_to_offline_document() {
    let (_store, fetcher, engine) = active_engine().await;
    fetcher.set_offline(true);

    let response = engine
        .handle_fetch(get(&format!("{ORIGIN}/")))
        .await
        .unwrap();
    assert_eq!(response.body().as_ref(), b"<offline>");
}

#[tokio::test]
async fn uncached_navigation_serves_offline_then_root() {
    let (store, fetcher, engine) = active_engine().await;
    fetcher.set_offline(true);

    // A document never visited still resolves to the offline page.
    let response = engine
        .handle_fetch(get(&format!("{ORIGIN}/guide.html")))
        .await
        .unwrap();
    assert_eq!(response.body().as_ref(), b"<offline>");

    // Without the offline page, the root document is the fallback.
    let partition = store
        .open(&PartitionKey::new("static", common::VERSION))
        .await
        .unwrap();
    partition
        .remove(&get(&format!("{ORIGIN}/offline.html")).cache_key())
        .await
        .unwrap();
    let response = engine
        .handle_fetch(get(&format!("{ORIGIN}/guide.html")))
        .await
        .unwrap();
    assert_eq!(response.body().as_ref(), b"<home>");

    // With both gone, the failure propagates.
    partition
        .remove(&get(&format!("{ORIGIN}/")).cache_key())
        .await
        .unwrap();
    let err = engine
        .handle_fetch(get(&format!("{ORIGIN}/guide.html")))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Network(_)));
}

#[tokio::test]
async fn unmatched_origin_passes_through_uncached() {
    let (store, fetcher, engine) = active_engine().await;
    let url = "https://tracker.example/pixel.gif";
    fetcher.respond(url, "gif");

    let response = engine.handle_fetch(get(url)).await.unwrap();
    assert_eq!(response.body().as_ref(), b"gif");

    let key = get(url).cache_key();
    for partition_key in store.partitions().await.unwrap() {
        let partition = store.open(&partition_key).await.unwrap();
        assert!(partition.read(&key).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn non_success_response_is_returned_but_not_cached() {
    let (store, fetcher, engine) = active_engine().await;
    let url = format!("{ORIGIN}/api/flaky");
    fetcher.respond_status(&url, 503, "try later");

    let response = engine.handle_fetch(get(&url)).await.unwrap();
    assert_eq!(response.status().as_u16(), 503);

    let partition = store
        .open(&PartitionKey::new("api", common::VERSION))
        .await
        .unwrap();
    assert!(partition.read(&get(&url).cache_key()).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn overlapping_revalidations_leave_last_completed_write() {
    let (store, _fetcher, _engine) = active_engine().await;
    let key = get(&format!("{ORIGIN}/app.css")).cache_key();
    let partition = store
        .open(&PartitionKey::new("static", common::VERSION))
        .await
        .unwrap();

    // Issued first, completes last; the write completing last must win.
    let slow = tokio::spawn({
        let partition = partition.clone();
        let key = key.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(80)).await;
            partition
                .write(key, CacheEntry::new(ResponseSnapshot::ok("refresh-late".into())))
                .await
                .unwrap();
        }
    });
    let fast = tokio::spawn({
        let partition = partition.clone();
        let key = key.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            partition
                .write(key, CacheEntry::new(ResponseSnapshot::ok("refresh-early".into())))
                .await
                .unwrap();
        }
    });

    fast.await.unwrap();
    slow.await.unwrap();

    let entry = partition.read(&key).await.unwrap().unwrap();
    assert_eq!(entry.snapshot().body().as_ref(), b"refresh-late");
}

#[tokio::test]
async fn push_payload_is_shaped_and_republished() {
    let (_store, _fetcher, engine) = active_engine().await;
    let mut messages = engine.subscribe();

    let outcome = engine
        .dispatch(WorkerEvent::Message {
            payload: br#"{"title":"Reading ready"}"#.as_ref().into(),
        })
        .await
        .unwrap();
    assert_eq!(outcome, EventOutcome::Posted);

    match messages.try_recv().unwrap() {
        stratus::ClientMessage::Notification { payload } => {
            assert_eq!(payload.title, "Reading ready");
            assert_eq!(payload.url, "/");
        }
        other => panic!("unexpected message {other:?}"),
    }
}
