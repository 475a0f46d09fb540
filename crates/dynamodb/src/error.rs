use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use rendezvous_store::StoreError;

/// Service error codes that mean the caller lacks rights, not that the
/// service misbehaved.
const PERMISSION_CODES: &[&str] = &[
    "AccessDeniedException",
    "UnrecognizedClientException",
    "InvalidSignatureException",
    "ExpiredTokenException",
    "MissingAuthenticationTokenException",
];

/// Service error codes for capacity or availability problems.
const UNAVAILABLE_CODES: &[&str] = &[
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "ThrottlingException",
    "InternalServerError",
    "ServiceUnavailable",
];

/// Map an SDK failure onto the store error taxonomy.
pub(crate) fn classify<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => StoreError::Unavailable(message),
        _ => classify_code(err.as_service_error().and_then(|e| e.code()), message),
    }
}

pub(crate) fn classify_code(code: Option<&str>, message: String) -> StoreError {
    match code {
        Some(c) if PERMISSION_CODES.contains(&c) => StoreError::PermissionDenied(message),
        Some(c) if UNAVAILABLE_CODES.contains(&c) => StoreError::Unavailable(message),
        _ => StoreError::Backend(message),
    }
}
