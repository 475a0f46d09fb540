//! Verdict poller: constant-cadence point reads until a verdict or deadline.

use std::sync::Arc;
use std::time::Duration;

use rendezvous_store::{CoordinationRecord, CoordinationStore, RecordKey};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::CoordinationError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(300);
/// Upper bound for configured interval and timeout seconds (one week).
pub const MAX_POLL_SECS: i64 = 7 * 24 * 60 * 60;

/// Cadence and overall deadline of one polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl PollSettings {
    /// Zero durations fall back to the defaults.
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        PollSettings {
            interval: if interval.is_zero() {
                DEFAULT_POLL_INTERVAL
            } else {
                interval
            },
            timeout: if timeout.is_zero() {
                DEFAULT_POLL_TIMEOUT
            } else {
                timeout
            },
        }
    }

    /// Build from configured whole seconds. Zero means "use the default";
    /// negative values and values above [`MAX_POLL_SECS`] are rejected.
    pub fn from_secs(interval: i64, timeout: i64) -> Result<Self, CoordinationError> {
        let secs = |name: &str, value: i64| {
            if value > MAX_POLL_SECS {
                return Err(CoordinationError::validation(format!(
                    "{name} must not exceed {MAX_POLL_SECS} seconds, got {value}"
                )));
            }
            u64::try_from(value).map_err(|_| {
                CoordinationError::validation(format!("{name} must not be negative, got {value}"))
            })
        };
        Ok(PollSettings::new(
            Duration::from_secs(secs("poll_interval", interval)?),
            Duration::from_secs(secs("poll_timeout", timeout)?),
        ))
    }
}

/// Waits for the external actor's verdict on a coordination record.
///
/// The first read happens one interval after the call starts. Absent
/// records and absent or null verdicts mean "not ready". Any store error
/// ends the session immediately.
pub struct VerdictPoller {
    store: Arc<dyn CoordinationStore>,
}

impl VerdictPoller {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        VerdictPoller { store }
    }

    /// Poll until a verdict appears or `settings.timeout` elapses.
    ///
    /// The deadline also cancels an in-flight read. The record is left in
    /// place either way.
    pub async fn await_verdict(
        &self,
        run_id: &str,
        cluster_id: &str,
        settings: PollSettings,
    ) -> Result<String, CoordinationError> {
        if run_id.is_empty() {
            return Err(CoordinationError::validation("analysis run UID is required"));
        }
        let settings = PollSettings::new(settings.interval, settings.timeout);
        let key = RecordKey::new(run_id, cluster_id);

        match time::timeout(settings.timeout, self.poll(&key, settings.interval)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    key = %key,
                    timeout = ?settings.timeout,
                    "verdict not found before timeout"
                );
                Err(CoordinationError::Timeout(
                    "verdict not found before timeout".to_string(),
                ))
            }
        }
    }

    async fn poll(&self, key: &RecordKey, interval: Duration) -> Result<String, CoordinationError> {
        let first_read = Instant::now().checked_add(interval).ok_or_else(|| {
            CoordinationError::validation(format!("poll interval {:?} is out of range", interval))
        })?;
        let mut ticker = time::interval_at(first_read, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut reads: u64 = 0;

        loop {
            ticker.tick().await;
            reads += 1;

            let item = self
                .store
                .get(key)
                .await
                .map_err(CoordinationError::store_read)?;

            match item.as_ref().and_then(CoordinationRecord::verdict_of) {
                Some(verdict) => {
                    tracing::info!(key = %key, reads, verdict, "verdict received");
                    return Ok(verdict.to_string());
                }
                None => {
                    tracing::debug!(
                        key = %key,
                        reads,
                        record_found = item.is_some(),
                        "verdict not yet available, polling again in {:?}",
                        interval
                    );
                }
            }
        }
    }
}
