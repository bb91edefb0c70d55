//! Error types for transports and the requester.

use thiserror::Error;

/// Errors raised by an [`RpcTransport`](crate::transport::RpcTransport)
/// while moving a payload to the node and back.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, non-2xx status, etc.).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response body could not be parsed as JSON.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// An unexpected error.
    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by the requester and the watch engine.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The RPC method name was empty.
    #[error("Invalid method: RPC method name must not be empty")]
    InvalidMethod,

    /// No usable connection was supplied, or it could not be built.
    #[error("Invalid connection: {0}")]
    InvalidConnection(String),

    /// The node answered with an RPC error or a malformed payload.
    #[error("Invalid JSON RPC response: {0}")]
    InvalidResponse(String),

    /// Arity check failed. The requester never raises this itself; API
    /// wrappers that know a method's arity do.
    #[error("Invalid number of parameters for RPC method '{method}': got {got}, expected {expected}")]
    InvalidParamCount {
        method: String,
        expected: usize,
        got: usize,
    },

    /// Transport failure, passed through untouched.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A valid result could not be decoded into the requested type.
    #[error("Result decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// `watch` was called outside of a Tokio runtime.
    #[error("No Tokio runtime available to drive watch polling")]
    NoRuntime,
}

impl ClientError {
    /// Returns `true` if the node itself rejected or garbled the call.
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Self::InvalidResponse(_))
    }

    /// Returns `true` if the failure happened below the JSON-RPC layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
