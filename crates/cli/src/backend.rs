use std::sync::Arc;

use async_trait::async_trait;
use rendezvous_dynamodb::DynamoDbConnector;
use rendezvous_store::{CoordinationStore, MemoryStore, StoreConnector, StoreError, StoreSettings};

/// Store backend selected on the command line.
pub(crate) enum Backend {
    /// Process-local store; nothing outside this process sees it.
    Memory(MemoryStore),
    DynamoDb(DynamoDbConnector),
}

impl Backend {
    pub(crate) fn select(memory: bool) -> Self {
        if memory {
            Backend::Memory(MemoryStore::new())
        } else {
            Backend::DynamoDb(DynamoDbConnector)
        }
    }

    /// The in-memory store, when that backend is selected.
    pub(crate) fn memory(&self) -> Option<&MemoryStore> {
        match self {
            Backend::Memory(store) => Some(store),
            Backend::DynamoDb(_) => None,
        }
    }
}

#[async_trait]
impl StoreConnector for Backend {
    async fn connect(
        &self,
        settings: &StoreSettings,
    ) -> Result<Arc<dyn CoordinationStore>, StoreError> {
        match self {
            Backend::Memory(store) => store.connect(settings).await,
            Backend::DynamoDb(connector) => connector.connect(settings).await,
        }
    }
}
