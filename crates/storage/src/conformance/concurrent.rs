use std::future::Future;
use std::sync::Arc;

use time::Duration;

use super::{make_record, publish, read_record, write_verdict, TestResult, BASE_TIME};
use crate::{AttributeValue, CoordinationStore};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "concurrent",
        "concurrent_publishes_different_runs_all_visible",
        concurrent_publishes_different_runs_all_visible(factory).await,
    ));
    results.push(TestResult::from_result(
        "concurrent",
        "concurrent_publishes_same_key_leave_one_record",
        concurrent_publishes_same_key_leave_one_record(factory).await,
    ));
    results.push(TestResult::from_result(
        "concurrent",
        "concurrent_publish_and_verdict_both_survive",
        concurrent_publish_and_verdict_both_survive(factory).await,
    ));

    results
}

// ── Independent attempts sharing one store ───────────────────────────────────

/// N tasks each publish their own run. Every record must be readable with
/// its own identity afterwards.
async fn concurrent_publishes_different_runs_all_visible<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = Arc::new(factory().await);

    let mut handles = Vec::new();
    for i in 0..N {
        let s = store.clone();
        handles.push(tokio::spawn(async move {
            let mut rec = make_record(&format!("run-{i}"), "eu-1");
            rec.template_name = format!("check-{i}");
            publish(&*s, &rec).await
        }));
    }
    for handle in handles {
        handle.await.map_err(|e| format!("task panic: {e}"))??;
    }

    for i in 0..N {
        let key = make_record(&format!("run-{i}"), "eu-1").key();
        let read = read_record(&*store, &key).await?;
        if read.template_name != format!("check-{i}") {
            return Err(format!(
                "run-{i}: expected template 'check-{i}', got '{}'",
                read.template_name
            ));
        }
    }
    Ok(())
}

// ── Duplicate publishers for the same key ────────────────────────────────────

/// N tasks publish the same key with distinct timestamps. Exactly one record
/// remains and its timestamp is one of the written ones.
async fn concurrent_publishes_same_key_leave_one_record<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = Arc::new(factory().await);

    let mut handles = Vec::new();
    for i in 0..N {
        let s = store.clone();
        handles.push(tokio::spawn(async move {
            let mut rec = make_record("run-dup", "eu-1");
            rec.created_at = BASE_TIME + Duration::seconds(i as i64);
            publish(&*s, &rec).await
        }));
    }
    for handle in handles {
        handle.await.map_err(|e| format!("task panic: {e}"))??;
    }

    let read = read_record(&*store, &make_record("run-dup", "eu-1").key()).await?;
    let offset = (read.created_at - BASE_TIME).whole_seconds();
    if !(0..N as i64).contains(&offset) {
        return Err(format!(
            "created_at {} is not one of the published timestamps",
            read.created_at
        ));
    }
    if read.template_name != "canary-check" {
        return Err(format!(
            "identity attributes corrupted: template '{}'",
            read.template_name
        ));
    }
    Ok(())
}

// ── Publisher and external actor touch disjoint attributes ───────────────────

async fn concurrent_publish_and_verdict_both_survive<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let store = Arc::new(factory().await);
    let rec = make_record("run-race", "eu-1");
    let key = rec.key();

    let publisher = {
        let s = store.clone();
        let rec = rec.clone();
        tokio::spawn(async move { publish(&*s, &rec).await })
    };
    let actor = {
        let s = store.clone();
        let key = key.clone();
        tokio::spawn(
            async move { write_verdict(&*s, &key, AttributeValue::string("Passed")).await },
        )
    };
    publisher.await.map_err(|e| format!("task panic: {e}"))??;
    actor.await.map_err(|e| format!("task panic: {e}"))??;

    let read = read_record(&*store, &key).await?;
    if read.result.as_deref() != Some("Passed") {
        return Err(format!("verdict lost: {:?}", read.result));
    }
    if read.template_name != rec.template_name {
        return Err(format!(
            "identity lost: template '{}'",
            read.template_name
        ));
    }
    Ok(())
}
