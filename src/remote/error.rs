use thiserror::Error;

/// Failures talking to the catalog service.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RemoteError {
    /// The service answered with a non-success status.
    #[error("Catalog service returned {status}{}", .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    Status { status: u16, message: Option<String> },
    /// The request never produced a response (connection, timeout, ...).
    #[error("Catalog service unreachable: {0}")]
    Transport(String),
    #[error("Unexpected catalog service response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// The human-readable message the service attached to its error, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            RemoteError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Transport(err.to_string())
        }
    }
}
