//! Error types for the REST endpoint layer.
//!
//! # Design
//! Two tiers. `Configuration` is fatal and surfaces synchronously while an
//! adapter or registry is being set up. Everything else is a recoverable
//! request failure handed back through the `Result` of an adapter call.
//! `HttpError` carries the raw status and body so callers can decide what a
//! non-success response means for them.

use thiserror::Error;

/// Errors produced while configuring endpoints or dispatching requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The adapter or registry was configured with values it cannot use.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The server answered with a status outside the `[200, 400)` band.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// A destructive storage operation matched no record.
    #[error("no record matches {0}")]
    NotFound(String),

    /// The adapter has no meaning for the requested verb.
    #[error("{adapter} adapter does not support {method}")]
    Unsupported { adapter: &'static str, method: String },

    /// The backing storage medium failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// Stored or loaded data could not be deserialized.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),
}

impl ApiError {
    /// Whether the error belongs to the fatal configuration tier.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApiError::Configuration(_))
    }

    /// The HTTP status of a rejected response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}
