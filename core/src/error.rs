//! Error types for the REST remote-call pipeline.
//!
//! # Design
//! Every failure surfaces synchronously to the caller of
//! `RestClient::call`; nothing is retried or recovered locally. Non-2xx
//! responses land in `HttpStatus` with the raw status code and body, and never
//! reach a format decoder. Decoding failures keep the raw body and the declared
//! format for debugging.

use thiserror::Error;

/// Errors returned by the request/response pipeline.
#[derive(Debug, Error)]
pub enum RestError {
    /// The method name cannot be mapped to a verb and resource path.
    #[error("unsupported method `{method}`: {reason}")]
    UnsupportedMethod { method: String, reason: String },

    /// A route in the method mapping is malformed.
    #[error("invalid route for `{method}`: {reason}")]
    InvalidRoute { method: String, reason: String },

    /// The transport could not complete the round-trip.
    #[error("transport failure for {url}: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a status outside 200..=299.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body does not parse under the declared format.
    #[error("cannot decode {format} response ({message}): {body}")]
    Decode {
        format: String,
        body: String,
        message: String,
    },

    /// No decoder is registered for the declared response format.
    #[error("no decoder registered for format `{0}`")]
    UnsupportedFormat(String),

    /// Arguments or results could not be converted to or from their wire form.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A request strategy refused to prepare the request.
    #[error("{strategy} strategy failed: {message}")]
    Strategy {
        strategy: &'static str,
        message: String,
    },

    /// A lazy relation was accessed while it was already being resolved.
    #[error("relation `{0}` is already being resolved")]
    RelationCycle(String),

    /// A lazy relation failed on an earlier access.
    #[error("relation `{relation}` failed to resolve: {message}")]
    RelationFailed { relation: String, message: String },
}

impl RestError {
    /// Shorthand for strategies reporting a failure.
    pub fn strategy(strategy: &'static str, message: impl Into<String>) -> Self {
        RestError::Strategy {
            strategy,
            message: message.into(),
        }
    }
}
