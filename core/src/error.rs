//! Error types for the Fitbit request builder.
//!
//! # Design
//! `InvalidArgument` is the only error raised before a request exists: every
//! `build_*` method validates its inputs up front, so a caller either gets a
//! complete `HttpRequest` or this error and never a half-built request.
//! The remaining variants describe what came back from the HTTP delegate.
//! `NotFound` is split out of `HttpError` because deleting an unknown log id
//! is the common failure callers branch on.

use thiserror::Error;

/// Errors returned by `FitbitClient` build/parse methods and by `FitbitApi`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A date, time, or option value was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a status other than the expected one and 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be encoded.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The HTTP delegate failed before a response was received.
    #[error("transport failed: {0}")]
    Transport(String),
}

impl ApiError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ApiError::InvalidArgument(msg.into())
    }
}
