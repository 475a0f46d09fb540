//! Request publisher: one unconditional upsert of the coordination record.

use std::sync::Arc;
use std::time::Duration;

use rendezvous_store::{CoordinationRecord, CoordinationStore};

use crate::clock::{Clock, SystemClock};
use crate::error::CoordinationError;

/// Deadline for the single publish write.
pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(30);

/// Writes the coordination record that announces a pending validation.
///
/// Exactly one write attempt per call, no retries. The record carries only
/// identity attributes, so publishing never touches the verdict field.
pub struct Publisher {
    store: Arc<dyn CoordinationStore>,
    clock: Arc<dyn Clock>,
    deadline: Duration,
}

impl Publisher {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Publisher {
            store,
            clock: Arc::new(SystemClock),
            deadline: PUBLISH_TIMEOUT,
        }
    }

    /// Replace the timestamp source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the publish deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Publish a pending request for `run_id`.
    ///
    /// `cluster_id` and `namespace` may be empty and are written as-is; a
    /// non-empty `cluster_id` also becomes part of the record key.
    pub async fn publish(
        &self,
        run_id: &str,
        template_name: &str,
        cluster_id: &str,
        namespace: &str,
    ) -> Result<CoordinationRecord, CoordinationError> {
        validate_identity(run_id, template_name)?;

        let record = CoordinationRecord {
            run_id: run_id.to_string(),
            template_name: template_name.to_string(),
            namespace: namespace.to_string(),
            origin_cluster_id: cluster_id.to_string(),
            created_at: self.clock.now(),
            result: None,
        };
        let key = record.key();

        match tokio::time::timeout(
            self.deadline,
            self.store.put(&key, record.identity_attributes()),
        )
        .await
        {
            Ok(Ok(())) => {
                tracing::debug!(
                    key = %key,
                    template = %record.template_name,
                    namespace = %record.namespace,
                    "published coordination record"
                );
                Ok(record)
            }
            Ok(Err(source)) => {
                tracing::warn!(key = %key, error = %source, "publish failed");
                Err(CoordinationError::store_write(source))
            }
            Err(_) => {
                tracing::warn!(key = %key, deadline = ?self.deadline, "publish timed out");
                Err(CoordinationError::Timeout(format!(
                    "publish did not complete within {:?}",
                    self.deadline
                )))
            }
        }
    }
}

/// Required-input checks shared by every entry point that publishes.
pub(crate) fn validate_identity(
    run_id: &str,
    template_name: &str,
) -> Result<(), CoordinationError> {
    if run_id.is_empty() {
        return Err(CoordinationError::validation("analysis run UID is required"));
    }
    if template_name.is_empty() {
        return Err(CoordinationError::validation("analysis_template is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rendezvous_store::{MemoryStore, RecordKey, StoreError};
    use std::sync::Mutex;
    use time::macros::datetime;
    use time::OffsetDateTime;

    /// Hands out the queued timestamps in order, repeating the last one.
    struct SteppingClock(Mutex<Vec<OffsetDateTime>>);

    impl Clock for SteppingClock {
        fn now(&self) -> OffsetDateTime {
            let mut times = self.0.lock().unwrap();
            if times.len() > 1 {
                times.remove(0)
            } else {
                times[0]
            }
        }
    }

    fn publisher(store: &MemoryStore) -> Publisher {
        Publisher::new(Arc::new(store.clone()))
    }

    #[tokio::test]
    async fn empty_run_id_rejected_without_store_access() {
        let store = MemoryStore::new();
        let err = publisher(&store)
            .publish("", "canary-check", "eu-1", "default")
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinationError::Validation(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn empty_template_rejected_without_store_access() {
        let store = MemoryStore::new();
        let err = publisher(&store)
            .publish("abc-123", "", "eu-1", "default")
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinationError::Validation(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn published_identity_reads_back() {
        let store = MemoryStore::new();
        let clock = Arc::new(SteppingClock(Mutex::new(vec![datetime!(
            2025-06-01 08:30:00 UTC
        )])));
        let published = publisher(&store)
            .with_clock(clock)
            .publish("abc-123", "canary-check", "eu-1", "payments")
            .await
            .unwrap();

        let attrs = store.item(&RecordKey::new("abc-123", "eu-1")).unwrap();
        let read = CoordinationRecord::from_attributes(&attrs).unwrap();
        assert_eq!(read, published);
        assert_eq!(read.template_name, "canary-check");
        assert_eq!(read.origin_cluster_id, "eu-1");
        assert_eq!(read.namespace, "payments");
        assert_eq!(read.created_at, datetime!(2025-06-01 08:30:00 UTC));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn empty_cluster_and_namespace_are_written() {
        let store = MemoryStore::new();
        publisher(&store)
            .publish("abc-123", "canary-check", "", "")
            .await
            .unwrap();

        let attrs = store.item(&RecordKey::new("abc-123", "")).unwrap();
        let read = CoordinationRecord::from_attributes(&attrs).unwrap();
        assert_eq!(read.origin_cluster_id, "");
        assert_eq!(read.namespace, "");
    }

    #[tokio::test]
    async fn republish_leaves_one_record_with_latest_timestamp() {
        let store = MemoryStore::new();
        let first = datetime!(2025-06-01 08:30:00 UTC);
        let second = datetime!(2025-06-01 08:35:00 UTC);
        let p = publisher(&store).with_clock(Arc::new(SteppingClock(Mutex::new(vec![
            first, second,
        ]))));

        p.publish("abc-123", "canary-check", "eu-1", "").await.unwrap();
        p.publish("abc-123", "canary-check", "eu-1", "").await.unwrap();

        assert_eq!(store.len(), 1);
        let attrs = store.item(&RecordKey::new("abc-123", "eu-1")).unwrap();
        let read = CoordinationRecord::from_attributes(&attrs).unwrap();
        assert_eq!(read.created_at, second);
    }

    #[tokio::test]
    async fn store_failure_is_wrapped_not_swallowed() {
        let store = MemoryStore::new();
        store.set_failure(Some(StoreError::PermissionDenied(
            "not authorized to perform PutItem".to_string(),
        )));
        let err = publisher(&store)
            .publish("abc-123", "canary-check", "eu-1", "")
            .await
            .unwrap_err();
        match err {
            CoordinationError::Store { operation, source } => {
                assert_eq!(operation, "write");
                assert!(matches!(source, StoreError::PermissionDenied(_)));
            }
            other => panic!("expected store error, got {other:?}"),
        }
        assert_eq!(store.write_count(), 1);
    }
}
