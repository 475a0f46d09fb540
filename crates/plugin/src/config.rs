//! Plugin configuration as it appears in a metric's plugin map.
//!
//! ```json
//! {
//!   "block/rollouts-plugin-distributed-analysis-runs": {
//!     "analysis_template": "canary-check",
//!     "cluster_id": "eu-1",
//!     "namespace": "payments",
//!     "poll_interval": 5,
//!     "poll_timeout": 300
//!   }
//! }
//! ```

use rendezvous_core::{CoordinationError, HandshakeRequest, PollSettings};
use rendezvous_store::StoreSettings;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::measurement::Metric;

/// Key of this provider's block in `metric.provider.plugin`.
pub const PLUGIN_NAME: &str = "block/rollouts-plugin-distributed-analysis-runs";

pub const DEFAULT_TABLE_NAME: &str = "KargoArgoRolloutsIntegration";
pub const DEFAULT_REGION: &str = "ap-southeast-2";

/// Provider settings. Every field is optional in JSON; empty strings and
/// zero durations are filled in by [`PluginConfig::with_defaults`] and
/// [`PluginConfig::poll_settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub table_name: String,
    pub region: String,
    pub cluster_id: String,
    pub analysis_template: String,
    pub namespace: String,
    /// Seconds between reads; 0 means 5.
    pub poll_interval: i64,
    /// Seconds before giving up; 0 means 300.
    pub poll_timeout: i64,
    /// Store endpoint override, for local emulators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
}

impl PluginConfig {
    /// Read the provider's block from `metric`. A metric without the block
    /// is an error.
    pub fn from_metric(metric: &Metric) -> Result<Self, ConfigError> {
        let raw = metric
            .provider
            .plugin
            .get(PLUGIN_NAME)
            .ok_or(ConfigError::Missing(PLUGIN_NAME))?;
        Ok(serde_json::from_value(raw.clone())?)
    }

    /// Parse either a bare configuration block or a whole metric document
    /// (recognized by its `provider` field).
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        if value.get("provider").is_some() {
            let metric: Metric = serde_json::from_value(value)?;
            Self::from_metric(&metric)
        } else {
            Ok(serde_json::from_value(value)?)
        }
    }

    /// Fill in the default table and region.
    pub fn with_defaults(mut self) -> Self {
        if self.table_name.is_empty() {
            self.table_name = DEFAULT_TABLE_NAME.to_string();
        }
        if self.region.is_empty() {
            self.region = DEFAULT_REGION.to_string();
        }
        self
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            table_name: self.table_name.clone(),
            region: self.region.clone(),
            endpoint_url: self.endpoint_url.clone(),
        }
    }

    pub fn poll_settings(&self) -> Result<PollSettings, CoordinationError> {
        PollSettings::from_secs(self.poll_interval, self.poll_timeout)
    }

    /// The handshake identity for the analysis run `run_id`.
    pub fn request(&self, run_id: &str) -> HandshakeRequest {
        HandshakeRequest {
            run_id: run_id.to_string(),
            template_name: self.analysis_template.clone(),
            cluster_id: self.cluster_id.clone(),
            namespace: self.namespace.clone(),
        }
    }
}
