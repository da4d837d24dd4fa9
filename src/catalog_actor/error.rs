use thiserror::Error;

use crate::remote::RemoteError;

/// Errors surfaced by catalog store operations. Every variant renders as a message
/// fit to show the user as-is.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    TransportError(String),
    #[error("Product not found: {0}")]
    NotFound(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl CatalogError {
    /// Wraps a service failure, preferring the service's own message over `fallback`.
    pub fn transport(err: &RemoteError, fallback: &str) -> Self {
        let message = err.server_message().unwrap_or(fallback);
        CatalogError::TransportError(message.to_string())
    }
}
