use thiserror::Error;

use crate::user_actor::UserError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    #[error("Please provide email and password")]
    MissingCredentials,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Your account has been deactivated. Please contact support.")]
    Deactivated,
    #[error("Not authorized to access this route")]
    NotAuthorized,
    #[error("User role {0} is not authorized to access this route")]
    RoleNotAllowed(&'static str),
    #[error("Current password is incorrect")]
    IncorrectPassword,
    #[error("Cannot register as admin")]
    AdminRegistration,
    #[error("No user found with this email")]
    UnknownEmail,
    #[error("Email could not be sent")]
    EmailNotSent,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Token signing failed: {0}")]
    Signing(String),
    #[error(transparent)]
    User(#[from] UserError),
}
