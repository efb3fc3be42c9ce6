//! Authentication error types.

use thiserror::Error;

use super::password::CredentialError;
use super::validation::FieldErrors;
use crate::db::RepositoryError;
use crate::services::session::SessionError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// One or more form fields failed validation.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Signup with an email that is already registered.
    #[error("email already registered")]
    DuplicateEmail,

    /// Change-email to an address another account uses.
    #[error("email already used by another account")]
    EmailTaken,

    /// Login with an email no account has.
    #[error("no account with that email")]
    EmailNotFound,

    /// Password does not match the stored hash.
    #[error("incorrect password")]
    WrongPassword,

    /// The operation needs a logged-in user.
    #[error("not logged in")]
    NotAuthenticated,

    /// Session store failure.
    #[error("session error: {0}")]
    Session(#[source] tower_sessions::session::Error),

    /// Repository error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl From<FieldErrors> for AuthError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<SessionError> for AuthError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::NotAuthenticated => Self::NotAuthenticated,
            SessionError::Store(e) => Self::Session(e),
        }
    }
}
