//! Host-facing data: the analysis run, the metric, and the measurement the
//! provider answers with. Field names serialize the way the rollout
//! controller spells them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// The analysis run a measurement is taken for. Only its identity matters
/// here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisRun {
    /// Unique per attempt; becomes the coordination record's run id.
    pub uid: String,
    pub name: String,
    pub namespace: String,
}

/// A metric definition as handed over by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    #[serde(default)]
    pub provider: MetricProviderSpec,
}

impl Metric {
    pub fn named(name: impl Into<String>) -> Self {
        Metric {
            name: name.into(),
            provider: MetricProviderSpec::default(),
        }
    }
}

/// Raw per-plugin configuration blocks, keyed by plugin name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricProviderSpec {
    #[serde(default)]
    pub plugin: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisPhase {
    Pending,
    Running,
    Successful,
    Failed,
    Error,
    Inconclusive,
}

/// One provider observation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<AnalysisPhase>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub started_at: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub finished_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Measurement {
    pub fn started(at: OffsetDateTime) -> Self {
        Measurement {
            started_at: Some(at),
            ..Measurement::default()
        }
    }

    /// Finish with `phase`.
    pub fn finish(mut self, phase: AnalysisPhase, at: OffsetDateTime) -> Self {
        self.phase = Some(phase);
        self.finished_at = Some(at);
        self
    }

    /// Finish as `Error`, carrying `message`.
    pub fn mark_error(mut self, message: impl Into<String>, at: OffsetDateTime) -> Self {
        self.message = message.into();
        self.finish(AnalysisPhase::Error, at)
    }

    pub fn is_successful(&self) -> bool {
        self.phase == Some(AnalysisPhase::Successful)
    }
}
