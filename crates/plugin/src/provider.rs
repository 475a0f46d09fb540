//! The metric provider lifecycle.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rendezvous_core::{Clock, Coordinator, SystemClock, Verdict, PUBLISH_TIMEOUT};
use rendezvous_store::StoreConnector;

use crate::config::PluginConfig;
use crate::error::PluginError;
use crate::measurement::{AnalysisPhase, AnalysisRun, Measurement, Metric};

/// Provider type reported to the host.
pub const PROVIDER_TYPE: &str = "RPCPlugin";

/// Lifecycle hooks a rollout controller drives for one metric provider.
#[async_trait]
pub trait MetricProvider: Send + Sync {
    fn init(&self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Take one measurement. Failures are reported inside the measurement,
    /// never as a separate error.
    async fn run(&self, run: &AnalysisRun, metric: &Metric) -> Measurement;

    fn resume(&self, run: &AnalysisRun, metric: &Metric, measurement: Measurement) -> Measurement;

    fn terminate(
        &self,
        run: &AnalysisRun,
        metric: &Metric,
        measurement: Measurement,
    ) -> Measurement;

    fn garbage_collect(
        &self,
        run: &AnalysisRun,
        metric: &Metric,
        limit: usize,
    ) -> Result<(), PluginError>;

    fn provider_type(&self) -> &str;

    fn get_metadata(&self, metric: &Metric) -> BTreeMap<String, String>;
}

/// Publishes the analysis run to a shared store and waits for another
/// cluster to write the verdict.
pub struct DistributedAnalysisProvider<C> {
    connector: C,
    clock: Arc<dyn Clock>,
    publish_deadline: Duration,
}

impl<C: StoreConnector> DistributedAnalysisProvider<C> {
    pub fn new(connector: C) -> Self {
        DistributedAnalysisProvider {
            connector,
            clock: Arc::new(SystemClock),
            publish_deadline: PUBLISH_TIMEOUT,
        }
    }

    /// Replace the source of measurement and record timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_publish_deadline(mut self, deadline: Duration) -> Self {
        self.publish_deadline = deadline;
        self
    }

    /// Validate everything before opening a store connection, then run the
    /// handshake.
    async fn handshake(
        &self,
        run: &AnalysisRun,
        metric: &Metric,
    ) -> Result<(PluginConfig, Verdict), PluginError> {
        let cfg = PluginConfig::from_metric(metric)?.with_defaults();
        let request = cfg.request(&run.uid);
        request.validate()?;
        let poll = cfg.poll_settings()?;

        let store = self
            .connector
            .connect(&cfg.store_settings())
            .await
            .map_err(PluginError::Connect)?;
        let coordinator = Coordinator::new(store)
            .with_clock(self.clock.clone())
            .with_publish_deadline(self.publish_deadline);

        let verdict = coordinator.run(&request, poll).await?;
        Ok((cfg, verdict))
    }
}

/// `key=value` summary recorded as the measurement value.
fn measurement_value(cfg: &PluginConfig, run_id: &str, verdict: &Verdict) -> String {
    format!(
        "analysis_template={},cluster_id={},namespace={},analysis_run_uid={},result={}",
        cfg.analysis_template, cfg.cluster_id, cfg.namespace, run_id, verdict
    )
}

#[async_trait]
impl<C: StoreConnector> MetricProvider for DistributedAnalysisProvider<C> {
    async fn run(&self, run: &AnalysisRun, metric: &Metric) -> Measurement {
        let mut measurement = Measurement::started(self.clock.now());
        tracing::info!(run = %run.uid, metric = %metric.name, "starting distributed analysis");

        match self.handshake(run, metric).await {
            Ok((cfg, verdict)) => {
                measurement.value = measurement_value(&cfg, &run.uid, &verdict);
                match verdict.failure_message() {
                    None => {
                        tracing::info!(run = %run.uid, "analysis passed");
                        measurement.finish(AnalysisPhase::Successful, self.clock.now())
                    }
                    Some(message) => {
                        tracing::warn!(
                            run = %run.uid,
                            verdict = %verdict,
                            "analysis did not pass"
                        );
                        measurement.mark_error(message, self.clock.now())
                    }
                }
            }
            Err(err) => {
                tracing::warn!(run = %run.uid, error = %err, "distributed analysis failed");
                measurement.mark_error(err.to_string(), self.clock.now())
            }
        }
    }

    fn resume(
        &self,
        _run: &AnalysisRun,
        _metric: &Metric,
        measurement: Measurement,
    ) -> Measurement {
        measurement
    }

    fn terminate(
        &self,
        _run: &AnalysisRun,
        _metric: &Metric,
        measurement: Measurement,
    ) -> Measurement {
        measurement
    }

    fn garbage_collect(
        &self,
        _run: &AnalysisRun,
        _metric: &Metric,
        _limit: usize,
    ) -> Result<(), PluginError> {
        Ok(())
    }

    fn provider_type(&self) -> &str {
        PROVIDER_TYPE
    }

    /// Table and region as configured, before defaults. An unreadable
    /// configuration yields an empty map.
    fn get_metadata(&self, metric: &Metric) -> BTreeMap<String, String> {
        let cfg = PluginConfig::from_metric(metric).unwrap_or_default();
        let mut metadata = BTreeMap::new();
        if !cfg.table_name.is_empty() {
            metadata.insert("DynamoDBTable".to_string(), cfg.table_name);
        }
        if !cfg.region.is_empty() {
            metadata.insert("AWSRegion".to_string(), cfg.region);
        }
        metadata
    }
}
