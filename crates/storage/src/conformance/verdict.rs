use std::future::Future;

use super::{make_record, publish, read_record, write_verdict, TestResult};
use crate::record::ATTR_RESULT;
use crate::{AttributeValue, CoordinationRecord, CoordinationStore};

pub(super) async fn run_verdict_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "verdict",
        "explicit_null_verdict_is_preserved",
        explicit_null_verdict_is_preserved(factory).await,
    ));
    results.push(TestResult::from_result(
        "verdict",
        "string_verdict_visible_after_write",
        string_verdict_visible_after_write(factory).await,
    ));
    results.push(TestResult::from_result(
        "verdict",
        "null_then_string_verdict",
        null_then_string_verdict(factory).await,
    ));
    results.push(TestResult::from_result(
        "verdict",
        "verdict_written_before_publish_survives",
        verdict_written_before_publish_survives(factory).await,
    ));

    results
}

// ── 1. Null stays null (not dropped, not coerced to a string) ────────────────

async fn explicit_null_verdict_is_preserved<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = make_record("run-1", "eu-1");
    publish(&s, &rec).await?;
    write_verdict(&s, &rec.key(), AttributeValue::Null).await?;

    let item = s
        .get(&rec.key())
        .await
        .map_err(|e| format!("get: {e}"))?
        .ok_or("item missing")?;
    if item.get(ATTR_RESULT) != Some(&AttributeValue::Null) {
        return Err(format!(
            "expected explicit null verdict, got {:?}",
            item.get(ATTR_RESULT)
        ));
    }
    if CoordinationRecord::verdict_of(&item).is_some() {
        return Err("null verdict decoded as a terminal verdict".to_string());
    }
    Ok(())
}

// ── 2. A string verdict is visible on the next read ──────────────────────────

async fn string_verdict_visible_after_write<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = make_record("run-2", "eu-1");
    publish(&s, &rec).await?;
    write_verdict(&s, &rec.key(), AttributeValue::string("Failed: p99 latency")).await?;

    let read = read_record(&s, &rec.key()).await?;
    if read.result.as_deref() != Some("Failed: p99 latency") {
        return Err(format!("expected verbatim verdict, got {:?}", read.result));
    }
    Ok(())
}

// ── 3. Null followed by a string verdict ─────────────────────────────────────

async fn null_then_string_verdict<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = make_record("run-3", "");
    publish(&s, &rec).await?;
    write_verdict(&s, &rec.key(), AttributeValue::Null).await?;
    write_verdict(&s, &rec.key(), AttributeValue::string("Passed")).await?;

    let read = read_record(&s, &rec.key()).await?;
    if read.result.as_deref() != Some("Passed") {
        return Err(format!("expected 'Passed', got {:?}", read.result));
    }
    Ok(())
}

// ── 4. External actor racing ahead of the publisher ──────────────────────────

async fn verdict_written_before_publish_survives<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = make_record("run-4", "eu-1");
    write_verdict(&s, &rec.key(), AttributeValue::string("Passed")).await?;
    publish(&s, &rec).await?;

    let read = read_record(&s, &rec.key()).await?;
    if read.result.as_deref() != Some("Passed") {
        return Err(format!(
            "expected early verdict to survive publish, got {:?}",
            read.result
        ));
    }
    if read.template_name != rec.template_name {
        return Err(format!(
            "expected identity attributes after publish, got template '{}'",
            read.template_name
        ));
    }
    Ok(())
}
