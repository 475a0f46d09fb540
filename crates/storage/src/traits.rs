use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::{Attributes, RecordKey};

/// The capability a shared key-value store must offer to act as the
/// rendezvous point between a publishing cluster and an external verdict
/// writer.
///
/// ## Upsert Semantics
///
/// `put` creates the item if absent and otherwise overwrites exactly the
/// attributes it is given. Attributes not named in the call are left alone,
/// so the publisher (identity attributes) and the external actor (the
/// `Result` attribute) never overwrite each other's writes. The key
/// attributes are always stored as part of the item.
///
/// ## Not Found
///
/// `get` returns `Ok(None)` when no item exists for the key. Errors are
/// reserved for failures of the store itself.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync + 'static` so one handle can be
/// shared across concurrent analysis attempts.
#[async_trait]
pub trait CoordinationStore: Send + Sync + 'static {
    /// Unconditionally upsert `attributes` under `key`.
    async fn put(&self, key: &RecordKey, attributes: Attributes) -> Result<(), StoreError>;

    /// Point lookup by key.
    async fn get(&self, key: &RecordKey) -> Result<Option<Attributes>, StoreError>;
}

#[async_trait]
impl<S: CoordinationStore + ?Sized> CoordinationStore for Arc<S> {
    async fn put(&self, key: &RecordKey, attributes: Attributes) -> Result<(), StoreError> {
        (**self).put(key, attributes).await
    }

    async fn get(&self, key: &RecordKey) -> Result<Option<Attributes>, StoreError> {
        (**self).get(key).await
    }
}
