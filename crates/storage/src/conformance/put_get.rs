use std::future::Future;

use super::{make_record, publish, read_record, TestResult};
use crate::record::{ATTR_CLUSTER_ID, ATTR_RESULT, ATTR_RUN_ID};
use crate::{AttributeValue, CoordinationStore, RecordKey};

pub(super) async fn run_put_get_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "put_get",
        "put_then_get_returns_identity_attributes",
        put_then_get_returns_identity_attributes(factory).await,
    ));
    results.push(TestResult::from_result(
        "put_get",
        "get_missing_key_returns_none",
        get_missing_key_returns_none(factory).await,
    ));
    results.push(TestResult::from_result(
        "put_get",
        "stored_item_carries_key_attributes",
        stored_item_carries_key_attributes(factory).await,
    ));
    results.push(TestResult::from_result(
        "put_get",
        "empty_namespace_and_cluster_written_as_is",
        empty_namespace_and_cluster_written_as_is(factory).await,
    ));
    results.push(TestResult::from_result(
        "put_get",
        "fresh_record_has_no_verdict",
        fresh_record_has_no_verdict(factory).await,
    ));

    results
}

// ── 1. Identity attributes read back exactly ─────────────────────────────────

async fn put_then_get_returns_identity_attributes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = make_record("run-1", "eu-1");
    publish(&s, &rec).await?;

    let read = read_record(&s, &rec.key()).await?;
    if read != rec {
        return Err(format!("expected {:?}, got {:?}", rec, read));
    }
    Ok(())
}

// ── 2. Missing key is Ok(None), not an error ─────────────────────────────────

async fn get_missing_key_returns_none<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get(&RecordKey::new("never-written", "")).await {
        Ok(None) => Ok(()),
        other => Err(format!("expected Ok(None), got {:?}", other)),
    }
}

// ── 3. Key attributes are part of the stored item ────────────────────────────

async fn stored_item_carries_key_attributes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = make_record("run-2", "us-2");
    publish(&s, &rec).await?;

    let item = s
        .get(&rec.key())
        .await
        .map_err(|e| format!("get: {e}"))?
        .ok_or("item missing")?;
    if item.get(ATTR_RUN_ID) != Some(&AttributeValue::string("run-2")) {
        return Err(format!("bad {}: {:?}", ATTR_RUN_ID, item.get(ATTR_RUN_ID)));
    }
    if item.get(ATTR_CLUSTER_ID) != Some(&AttributeValue::string("us-2")) {
        return Err(format!(
            "bad {}: {:?}",
            ATTR_CLUSTER_ID,
            item.get(ATTR_CLUSTER_ID)
        ));
    }
    Ok(())
}

// ── 4. Empty optional fields survive the round trip ──────────────────────────

async fn empty_namespace_and_cluster_written_as_is<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut rec = make_record("run-3", "");
    rec.namespace = String::new();
    publish(&s, &rec).await?;

    let read = read_record(&s, &RecordKey::new("run-3", "")).await?;
    if !read.namespace.is_empty() || !read.origin_cluster_id.is_empty() {
        return Err(format!(
            "expected empty namespace and cluster, got {:?}/{:?}",
            read.namespace, read.origin_cluster_id
        ));
    }
    Ok(())
}

// ── 5. A published record has no verdict until one is written ────────────────

async fn fresh_record_has_no_verdict<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = make_record("run-4", "eu-1");
    publish(&s, &rec).await?;

    let item = s
        .get(&rec.key())
        .await
        .map_err(|e| format!("get: {e}"))?
        .ok_or("item missing")?;
    match item.get(ATTR_RESULT) {
        None | Some(AttributeValue::Null) => Ok(()),
        Some(other) => Err(format!("expected no verdict, got {:?}", other)),
    }
}
