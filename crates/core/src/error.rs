use rendezvous_store::StoreError;

/// Failure of one handshake step. None of these are retried internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinationError {
    /// Missing or malformed input, detected before any store access.
    #[error("validation error: {0}")]
    Validation(String),

    /// The backing store failed. Transient and permanent failures are not
    /// distinguished.
    #[error("failed to {operation} coordination record: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// A publish or poll deadline expired.
    #[error("timeout: {0}")]
    Timeout(String),
}

impl CoordinationError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        CoordinationError::Validation(message.into())
    }

    pub(crate) fn store_write(source: StoreError) -> Self {
        CoordinationError::Store {
            operation: "write",
            source,
        }
    }

    pub(crate) fn store_read(source: StoreError) -> Self {
        CoordinationError::Store {
            operation: "read",
            source,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, CoordinationError::Timeout(_))
    }
}
