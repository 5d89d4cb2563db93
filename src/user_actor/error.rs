use thiserror::Error;

use crate::actor_framework::FrameworkError;

/// Errors that can occur during user operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),
    #[error("User already exists with this email")]
    AlreadyExists,
    #[error("User validation error: {0}")]
    ValidationError(String),
    #[error("Invalid or expired reset token")]
    InvalidResetToken,
    #[error("Notification not found: {0}")]
    NotificationNotFound(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for UserError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::NotFound(id) => UserError::NotFound(id),
            FrameworkError::Conflict(_) => UserError::AlreadyExists,
            other => UserError::ActorCommunicationError(other.to_string()),
        }
    }
}
