use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::traits::CoordinationStore;

/// Explicit connection settings for a store backend.
///
/// Built from plugin configuration and handed to a [`StoreConnector`]; no
/// backend reads process-wide state to find its table or region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Target table / collection.
    pub table_name: String,
    pub region: String,
    /// Override for the service endpoint (e.g. a local emulator).
    pub endpoint_url: Option<String>,
}

/// Builds a store handle from [`StoreSettings`].
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(
        &self,
        settings: &StoreSettings,
    ) -> Result<Arc<dyn CoordinationStore>, StoreError>;
}

/// Every connection resolves to the same shared in-memory map, whatever the
/// settings say.
#[async_trait]
impl StoreConnector for MemoryStore {
    async fn connect(
        &self,
        _settings: &StoreSettings,
    ) -> Result<Arc<dyn CoordinationStore>, StoreError> {
        Ok(Arc::new(self.clone()))
    }
}
