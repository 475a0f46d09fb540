use rendezvous_core::CoordinationError;
use rendezvous_store::StoreError;

/// Problems with the plugin block of a metric.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("metric has no '{0}' plugin configuration")]
    Missing(&'static str),
    #[error("invalid plugin configuration: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Anything that ends a provider run in an `Error` measurement.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to connect to coordination store: {0}")]
    Connect(#[source] StoreError),
    #[error(transparent)]
    Coordination(#[from] CoordinationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordination_errors_display_unchanged() {
        let inner = CoordinationError::Validation("analysis_template is required".into());
        let err: PluginError = inner.clone().into();
        assert_eq!(err.to_string(), inner.to_string());
    }

    #[test]
    fn missing_block_names_the_plugin() {
        let err = ConfigError::Missing("acme/verdicts");
        assert_eq!(
            err.to_string(),
            "metric has no 'acme/verdicts' plugin configuration"
        );
    }
}
