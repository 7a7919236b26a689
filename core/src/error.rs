//! Error types for the CERTEUS API client.
//!
//! # Design
//! Failures fall into three families: the request never produced a response
//! (`Transport`), the service answered with a non-2xx status (`Http`), or a
//! 2xx body did not match the expected shape (`Decode`). Construction-time
//! problems (`InvalidBaseUrl`) and body encoding (`Encode`) round out the set.
//! Nothing here is retried or logged; every error goes straight back to the
//! caller.

use thiserror::Error;

/// Boxed cause of a transport-level failure (DNS, refused connection,
/// timeout, truncated body).
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by `CerteusClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL cannot be used to address endpoints.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A path parameter that cannot be addressed as a single URL segment
    /// (`""`, `"."` or `".."`).
    #[error("invalid path segment {0:?}")]
    InvalidPathSegment(String),

    /// No response was received.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// The service returned a status outside 200..300.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request payload could not be serialized to JSON.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    /// HTTP status code, when the service produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
