//! Error taxonomy for the chat core

use crate::message::Role;
use crate::stream::{StreamPhase, TurnId};

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Chat operation errors
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// A system message was appended after position 0
    #[error("Invalid role: {0} messages may only appear at the start of the history")]
    InvalidRole(Role),

    /// The persisted document failed to parse or validate
    #[error("Corrupt history: {0}")]
    CorruptHistory(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A second turn was submitted while one is still streaming
    #[error("Turn {active} is still streaming")]
    StaleSession { active: TurnId },

    #[error("Cannot {operation} while the session is {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: StreamPhase,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Errors reported by a [`ChatBackend`](crate::ChatBackend)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Server unreachable, request failed or the connection dropped
    #[error("{0}")]
    Unavailable(String),

    /// Server answered with something we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<BackendError> for ChatError {
    fn from(err: BackendError) -> Self {
        ChatError::BackendUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_maps_to_unavailable() {
        let err: ChatError = BackendError::Unavailable("connection refused".to_string()).into();
        assert!(matches!(err, ChatError::BackendUnavailable(ref m) if m == "connection refused"));
    }

    #[test]
    fn test_stale_session_message() {
        let err = ChatError::StaleSession {
            active: TurnId::first(),
        };
        assert_eq!(err.to_string(), "Turn #1 is still streaming");
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = ChatError::InvalidTransition {
            operation: "append a token",
            phase: StreamPhase::Done,
        };
        assert_eq!(err.to_string(), "Cannot append a token while the session is done");
    }
}
