//! Errors raised by the API layer.

use thiserror::Error;

use noderpc_core::ClientError;

use crate::namespace::Namespace;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown API operation: {namespace}.{name}")]
    UnknownOperation { namespace: Namespace, name: String },

    #[error("Unknown API namespace: {0}")]
    UnknownNamespace(String),

    #[error("API descriptor in namespace {namespace} has an empty name")]
    EmptyName { namespace: Namespace },

    #[error("Static API operation {namespace}.{name} cannot be watched")]
    NotWatchable { namespace: Namespace, name: String },

    /// A formatter rejected its input.
    #[error("Format error: {0}")]
    Format(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}
