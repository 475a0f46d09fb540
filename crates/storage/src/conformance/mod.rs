//! Conformance test suite for `CoordinationStore` implementations.
//!
//! This module provides a backend-agnostic test suite that any
//! `CoordinationStore` implementation can run to verify it is fit to act as
//! a rendezvous point. The suite covers:
//!
//! - **Put/get**: written identity attributes read back exactly, missing keys
//! - **Upsert**: repeated puts leave one item, last write wins per attribute
//! - **Key identity**: the cluster id component separates otherwise equal keys
//! - **Verdict**: null and string verdicts, verdict preserved across republish
//! - **Concurrency**: independent attempts sharing one store handle
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty store instance for each test:
//!
//! ```ignore
//! use rendezvous_store::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn dynamodb_local_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_table_store().await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod concurrent;
mod key;
mod put_get;
mod upsert;
mod verdict;

use std::fmt;
use std::future::Future;

use time::macros::datetime;
use time::OffsetDateTime;

use crate::record::{AttributeValue, CoordinationRecord, ATTR_RESULT};
use crate::{CoordinationStore, RecordKey};

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "put_get", "upsert", "verdict").
    pub category: String,
    /// Test name (e.g. "put_then_get_returns_identity_attributes").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a store backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// store instance, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(put_get::run_put_get_tests(&factory).await);
    results.extend(upsert::run_upsert_tests(&factory).await);
    results.extend(key::run_key_tests(&factory).await);
    results.extend(verdict::run_verdict_tests(&factory).await);
    results.extend(concurrent::run_concurrent_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

const BASE_TIME: OffsetDateTime = datetime!(2025-01-01 00:00:00 UTC);

fn make_record(run_id: &str, cluster_id: &str) -> CoordinationRecord {
    CoordinationRecord {
        run_id: run_id.to_string(),
        template_name: "canary-check".to_string(),
        namespace: "default".to_string(),
        origin_cluster_id: cluster_id.to_string(),
        created_at: BASE_TIME,
        result: None,
    }
}

/// Publish `record` the way the request publisher does.
async fn publish<S: CoordinationStore>(
    store: &S,
    record: &CoordinationRecord,
) -> Result<(), String> {
    store
        .put(&record.key(), record.identity_attributes())
        .await
        .map_err(|e| format!("put {}: {e}", record.key()))
}

/// Write a verdict the way the external actor does.
async fn write_verdict<S: CoordinationStore>(
    store: &S,
    key: &RecordKey,
    verdict: AttributeValue,
) -> Result<(), String> {
    let attrs = [(ATTR_RESULT.to_string(), verdict)].into_iter().collect();
    store
        .put(key, attrs)
        .await
        .map_err(|e| format!("put verdict {key}: {e}"))
}

async fn read_record<S: CoordinationStore>(
    store: &S,
    key: &RecordKey,
) -> Result<CoordinationRecord, String> {
    let attrs = store
        .get(key)
        .await
        .map_err(|e| format!("get {key}: {e}"))?
        .ok_or_else(|| format!("expected item under {key}, found none"))?;
    CoordinationRecord::from_attributes(&attrs).map_err(|e| format!("decode {key}: {e}"))
}
