//! End-to-end handshake scenarios against in-memory and scripted stores.
//!
//! All timing tests run on tokio's paused clock, so "seconds" below are
//! virtual and the tests finish instantly.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rendezvous_core::{
    CoordinationError, Coordinator, HandshakeRequest, PollSettings, Publisher, Verdict,
    VerdictPoller,
};
use rendezvous_store::{
    AttributeValue, Attributes, CoordinationStore, MemoryStore, RecordKey, StoreError,
    ATTR_RESULT,
};
use tokio::time::Instant;

// ──────────────────────────────────────────────
// Test stores
// ──────────────────────────────────────────────

/// Serves queued `get` responses in order, repeating the last one.
struct ScriptedStore {
    responses: Mutex<VecDeque<Option<Attributes>>>,
    reads: AtomicUsize,
}

impl ScriptedStore {
    fn new(responses: Vec<Option<Attributes>>) -> Self {
        ScriptedStore {
            responses: Mutex::new(responses.into()),
            reads: AtomicUsize::new(0),
        }
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CoordinationStore for ScriptedStore {
    async fn put(&self, _key: &RecordKey, _attributes: Attributes) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get(&self, _key: &RecordKey) -> Result<Option<Attributes>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            Ok(responses.pop_front().unwrap())
        } else {
            Ok(responses.front().cloned().unwrap_or(None))
        }
    }
}

/// A store whose calls never complete.
struct HangingStore;

#[async_trait]
impl CoordinationStore for HangingStore {
    async fn put(&self, _key: &RecordKey, _attributes: Attributes) -> Result<(), StoreError> {
        std::future::pending().await
    }

    async fn get(&self, _key: &RecordKey) -> Result<Option<Attributes>, StoreError> {
        std::future::pending().await
    }
}

fn item_with_result(result: AttributeValue) -> Option<Attributes> {
    let mut attrs = RecordKey::new("abc-123", "eu-1").to_attributes();
    attrs.insert(ATTR_RESULT.to_string(), result);
    Some(attrs)
}

fn request() -> HandshakeRequest {
    HandshakeRequest {
        run_id: "abc-123".to_string(),
        template_name: "canary-check".to_string(),
        cluster_id: "eu-1".to_string(),
        namespace: String::new(),
    }
}

fn secs(interval: u64, timeout: u64) -> PollSettings {
    PollSettings::new(Duration::from_secs(interval), Duration::from_secs(timeout))
}

// ──────────────────────────────────────────────
// Scenarios
// ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn verdict_on_third_read_succeeds_within_three_intervals() {
    let store = Arc::new(ScriptedStore::new(vec![
        None,
        item_with_result(AttributeValue::Null),
        item_with_result(AttributeValue::string("Passed")),
    ]));
    let coordinator = Coordinator::new(store.clone());

    let start = Instant::now();
    let verdict = coordinator.run(&request(), secs(1, 3)).await.unwrap();

    assert_eq!(verdict, Verdict::Passed);
    assert_eq!(store.reads(), 3);
    assert!(start.elapsed() <= Duration::from_millis(3_100));
}

#[tokio::test(start_paused = true)]
async fn no_verdict_within_timeout_fails_with_timeout() {
    let store = MemoryStore::new();
    let coordinator = Coordinator::new(Arc::new(store.clone()));

    let err = coordinator.run(&request(), secs(1, 2)).await.unwrap_err();
    assert_eq!(
        err,
        CoordinationError::Timeout("verdict not found before timeout".to_string())
    );
    // The record stays for external inspection.
    assert!(store.item(&RecordKey::new("abc-123", "eu-1")).is_some());
}

#[tokio::test(start_paused = true)]
async fn non_passed_verdict_is_carried_verbatim() {
    let store = MemoryStore::new();
    store.set_verdict(
        &RecordKey::new("abc-123", "eu-1"),
        Some("Failed: 5xx rate above 2%"),
    );
    let coordinator = Coordinator::new(Arc::new(store.clone()));

    let verdict = coordinator.run(&request(), secs(1, 10)).await.unwrap();
    assert!(!verdict.is_passed());
    assert!(verdict
        .failure_message()
        .unwrap()
        .contains("Failed: 5xx rate above 2%"));
}

// ──────────────────────────────────────────────
// Timing properties
// ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn returns_within_one_interval_of_verdict_appearing() {
    let store = MemoryStore::new();
    let key = RecordKey::new("abc-123", "eu-1");
    let poller = VerdictPoller::new(Arc::new(store.clone()));

    let writer = store.clone();
    let writer_key = key.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(7_500)).await;
        writer.set_verdict(&writer_key, Some("Passed"));
    });

    let start = Instant::now();
    let verdict = poller
        .await_verdict("abc-123", "eu-1", secs(5, 300))
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(verdict, "Passed");
    assert!(elapsed >= Duration::from_millis(7_500));
    assert!(elapsed <= Duration::from_millis(7_500) + Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn timeout_reported_no_later_than_timeout_plus_interval() {
    let store = MemoryStore::new();
    let poller = VerdictPoller::new(Arc::new(store.clone()));

    let start = Instant::now();
    let err = poller
        .await_verdict("abc-123", "eu-1", secs(4, 10))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(start.elapsed() <= Duration::from_secs(14));
}

#[tokio::test(start_paused = true)]
async fn poll_deadline_abandons_in_flight_read() {
    let poller = VerdictPoller::new(Arc::new(HangingStore));

    let start = Instant::now();
    let err = poller
        .await_verdict("abc-123", "", secs(1, 5))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(start.elapsed() <= Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn publish_deadline_fails_with_timeout() {
    let publisher = Publisher::new(Arc::new(HangingStore));

    let start = Instant::now();
    let err = publisher
        .publish("abc-123", "canary-check", "eu-1", "")
        .await
        .unwrap_err();

    assert!(matches!(err, CoordinationError::Timeout(_)));
    assert!(start.elapsed() >= Duration::from_secs(30));
    assert!(start.elapsed() < Duration::from_secs(31));
}

// ──────────────────────────────────────────────
// Failure propagation
// ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn publish_failure_skips_polling() {
    let store = MemoryStore::new();
    store.set_failure(Some(StoreError::PermissionDenied(
        "AccessDeniedException".to_string(),
    )));
    let coordinator = Coordinator::new(Arc::new(store.clone()));

    let err = coordinator.run(&request(), secs(1, 10)).await.unwrap_err();
    assert!(matches!(
        err,
        CoordinationError::Store {
            operation: "write",
            ..
        }
    ));
    assert_eq!(store.read_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn validation_failure_never_touches_store() {
    let store = MemoryStore::new();
    let coordinator = Coordinator::new(Arc::new(store.clone()));

    let mut req = request();
    req.template_name.clear();
    let err = coordinator.run(&req, secs(1, 10)).await.unwrap_err();

    assert!(matches!(err, CoordinationError::Validation(_)));
    assert_eq!(store.write_count(), 0);
    assert_eq!(store.read_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_attempts_do_not_interfere() {
    let store = MemoryStore::new();
    let shared: Arc<dyn CoordinationStore> = Arc::new(store.clone());

    let mut handles = Vec::new();
    for (run, verdict) in [("run-a", "Passed"), ("run-b", "Failed")] {
        let coordinator = Coordinator::new(shared.clone());
        let req = HandshakeRequest {
            run_id: run.to_string(),
            ..request()
        };
        handles.push(tokio::spawn(async move {
            coordinator.run(&req, secs(1, 30)).await
        }));
        let writer = store.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            writer.set_verdict(&RecordKey::new(run, "eu-1"), Some(verdict));
        });
    }

    let a = handles.remove(0).await.unwrap().unwrap();
    let b = handles.remove(0).await.unwrap().unwrap();
    assert_eq!(a, Verdict::Passed);
    assert_eq!(b, Verdict::NotPassed("Failed".to_string()));
    assert_eq!(store.len(), 2);
}
