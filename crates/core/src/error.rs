//! Error taxonomy shared by the game components.

use thiserror::Error;

/// Failures surfaced by the catalog, the ranking store and the session controller.
#[derive(Debug, Error)]
pub enum GameError {
    /// A backing store could not be read or written.
    #[error("storage error: {0:#}")]
    Storage(anyhow::Error),
    /// The caller supplied input the game cannot start or continue with.
    #[error("validation error: {0}")]
    Validation(String),
    /// A transition was requested from a state that does not allow it.
    #[error("state error: {0}")]
    State(String),
}

impl GameError {
    /// Wrap a storage collaborator failure.
    pub fn storage(err: impl Into<anyhow::Error>) -> Self {
        Self::Storage(err.into())
    }

    /// Build a validation error from a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Build a state error from a message.
    pub fn state(message: impl Into<String>) -> Self {
        Self::State(message.into())
    }

    /// Whether the error came from a store rather than from the caller.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Convenience alias used across the crate.
pub type Result<T, E = GameError> = std::result::Result<T, E>;
