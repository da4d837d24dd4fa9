use thiserror::Error;

/// Errors that can occur at the session gate.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error("Invalid MPIN. Please try again.")]
    AuthError,
    #[error("Not logged in. Run `login --pin <MPIN>` first.")]
    NotAuthenticated,
    #[error("Session storage error: {0}")]
    StorageError(String),
}
