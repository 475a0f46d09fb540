use std::future::Future;

use super::{make_record, publish, read_record, write_verdict, TestResult};
use crate::{AttributeValue, CoordinationStore, RecordKey};

pub(super) async fn run_key_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "key",
        "same_run_different_clusters_are_independent",
        same_run_different_clusters_are_independent(factory).await,
    ));
    results.push(TestResult::from_result(
        "key",
        "cluster_key_not_visible_without_cluster",
        cluster_key_not_visible_without_cluster(factory).await,
    ));
    results.push(TestResult::from_result(
        "key",
        "different_runs_are_independent",
        different_runs_are_independent(factory).await,
    ));

    results
}

// ── 1. Cluster id separates records for the same run ─────────────────────────

async fn same_run_different_clusters_are_independent<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let eu = make_record("run-1", "eu-1");
    let us = make_record("run-1", "us-1");
    publish(&s, &eu).await?;
    publish(&s, &us).await?;
    write_verdict(&s, &eu.key(), AttributeValue::string("Passed")).await?;

    let eu_read = read_record(&s, &eu.key()).await?;
    let us_read = read_record(&s, &us.key()).await?;
    if eu_read.result.as_deref() != Some("Passed") {
        return Err(format!("eu-1 verdict: {:?}", eu_read.result));
    }
    if us_read.result.is_some() {
        return Err(format!(
            "verdict leaked into us-1 record: {:?}",
            us_read.result
        ));
    }
    Ok(())
}

// ── 2. A cluster-scoped record is not found by the bare run key ──────────────

async fn cluster_key_not_visible_without_cluster<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    publish(&s, &make_record("run-2", "eu-1")).await?;

    match s.get(&RecordKey::new("run-2", "")).await {
        Ok(None) => Ok(()),
        other => Err(format!("expected Ok(None) for bare key, got {:?}", other)),
    }
}

// ── 3. Different runs never share a record ───────────────────────────────────

async fn different_runs_are_independent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let a = make_record("run-a", "");
    let mut b = make_record("run-b", "");
    b.template_name = "other-check".to_string();
    publish(&s, &a).await?;
    publish(&s, &b).await?;

    let a_read = read_record(&s, &a.key()).await?;
    if a_read.template_name != "canary-check" {
        return Err(format!(
            "run-a template overwritten: '{}'",
            a_read.template_name
        ));
    }
    Ok(())
}
