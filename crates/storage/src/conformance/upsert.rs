use std::future::Future;

use time::Duration;

use super::{make_record, publish, read_record, write_verdict, TestResult};
use crate::{AttributeValue, CoordinationStore};

pub(super) async fn run_upsert_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "upsert",
        "republish_keeps_latest_timestamp",
        republish_keeps_latest_timestamp(factory).await,
    ));
    results.push(TestResult::from_result(
        "upsert",
        "republish_is_idempotent_on_identity",
        republish_is_idempotent_on_identity(factory).await,
    ));
    results.push(TestResult::from_result(
        "upsert",
        "put_overwrites_named_attributes",
        put_overwrites_named_attributes(factory).await,
    ));
    results.push(TestResult::from_result(
        "upsert",
        "republish_preserves_existing_verdict",
        republish_preserves_existing_verdict(factory).await,
    ));

    results
}

// ── 1. Last write wins on the timestamp ──────────────────────────────────────

async fn republish_keeps_latest_timestamp<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let first = make_record("run-1", "eu-1");
    let mut second = first.clone();
    second.created_at = first.created_at + Duration::minutes(5);

    publish(&s, &first).await?;
    publish(&s, &second).await?;

    let read = read_record(&s, &first.key()).await?;
    if read.created_at != second.created_at {
        return Err(format!(
            "expected created_at {}, got {}",
            second.created_at, read.created_at
        ));
    }
    Ok(())
}

// ── 2. Identity attributes unchanged by a duplicate publish ──────────────────

async fn republish_is_idempotent_on_identity<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = make_record("run-2", "eu-1");
    publish(&s, &rec).await?;
    publish(&s, &rec).await?;

    let read = read_record(&s, &rec.key()).await?;
    if read != rec {
        return Err(format!("expected {:?}, got {:?}", rec, read));
    }
    Ok(())
}

// ── 3. Attributes named in a put replace earlier values ──────────────────────

async fn put_overwrites_named_attributes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = make_record("run-3", "");
    publish(&s, &rec).await?;

    let mut changed = rec.clone();
    changed.template_name = "smoke-test".to_string();
    publish(&s, &changed).await?;

    let read = read_record(&s, &rec.key()).await?;
    if read.template_name != "smoke-test" {
        return Err(format!(
            "expected template 'smoke-test', got '{}'",
            read.template_name
        ));
    }
    Ok(())
}

// ── 4. A publish never clobbers the external actor's verdict ─────────────────

async fn republish_preserves_existing_verdict<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: CoordinationStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let rec = make_record("run-4", "eu-1");
    publish(&s, &rec).await?;
    write_verdict(&s, &rec.key(), AttributeValue::string("Passed")).await?;
    publish(&s, &rec).await?;

    let read = read_record(&s, &rec.key()).await?;
    if read.result.as_deref() != Some("Passed") {
        return Err(format!(
            "expected verdict 'Passed' to survive republish, got {:?}",
            read.result
        ));
    }
    Ok(())
}
