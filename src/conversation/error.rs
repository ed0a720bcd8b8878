use thiserror::Error;

/// Errors returned by [`ConversationSession`](super::ConversationSession) operations.
///
/// Backend faults during an exchange are not errors at this level; they are
/// reported through [`SendOutcome::Failed`](super::SendOutcome::Failed).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The credential is missing, malformed, or was rejected by the backend.
    #[error("{0}")]
    Authentication(String),
    /// Any other setup fault (bad secrets file, client construction, unreachable backend).
    #[error("{0}")]
    Configuration(String),
    #[error("Session is not initialized. Provide an API key to start chatting.")]
    NotInitialized,
    #[error("Nothing to retry: the last message already has an answer")]
    NothingToRetry,
}

impl SessionError {
    /// Returns `true` for errors that keep the session from becoming usable.
    pub const fn is_setup_error(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::Configuration(_))
    }
}
