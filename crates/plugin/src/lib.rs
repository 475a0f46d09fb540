//! rendezvous-plugin: analysis metric provider for the verdict handshake.
//!
//! The host hands the provider an [`AnalysisRun`] and a [`Metric`]; the
//! provider reads its [`PluginConfig`] from the metric's plugin map,
//! publishes a coordination record through `rendezvous-core`, waits for the
//! external verdict, and answers with a [`Measurement`].
//!
//! Store backends are reached through a `rendezvous_store::StoreConnector`,
//! so the provider itself has no AWS dependency.

pub mod config;
pub mod error;
pub mod measurement;
pub mod provider;

pub use config::{PluginConfig, DEFAULT_REGION, DEFAULT_TABLE_NAME, PLUGIN_NAME};
pub use error::{ConfigError, PluginError};
pub use measurement::{AnalysisPhase, AnalysisRun, Measurement, Metric, MetricProviderSpec};
pub use provider::{DistributedAnalysisProvider, MetricProvider, PROVIDER_TYPE};
