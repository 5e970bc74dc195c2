//! Error types for the Checkly API client.
//!
//! # Design
//! A non-2xx response becomes `Api` when its body decodes as the vendor's
//! error shape, carrying the server's message (typically naming the offending
//! field). Bodies that do not decode land in `UnexpectedStatus` with the raw
//! status and body. Transport and JSON failures keep their underlying cause
//! as the error source.

use thiserror::Error;

use crate::http::TransportError;

/// Errors returned by `ChecklyClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The client was constructed without an API key.
    #[error("API key must not be empty")]
    MissingApiKey,

    /// An operation that addresses a single check was given an empty id.
    #[error("check id must not be empty")]
    MissingId,

    /// The id holds characters that would change the request path.
    #[error("invalid check id {0:?}")]
    InvalidId(String),

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    /// The server rejected the request and explained why.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The server returned a status the operation does not accept, with a
    /// body that is not a recognisable API error.
    #[error("unexpected response status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// A success response body could not be decoded.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// The check could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl ApiError {
    /// HTTP status of the response that caused this error, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } | ApiError::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
