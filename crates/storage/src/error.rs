/// All errors that can be returned by a CoordinationStore implementation.
///
/// "Record not found" is not an error: `get` reports it as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A record could not be converted to or from the backend representation.
    #[error("failed to serialize record {key}: {message}")]
    Serialization { key: String, message: String },

    /// The backend rejected the request for lack of permissions
    /// (missing IAM grant, wrong account, expired credentials).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The backend could not be reached (connection, DNS, throttling, timeouts
    /// inside the client).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}
