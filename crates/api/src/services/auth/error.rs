//! Authentication error types.

use thiserror::Error;

use craftly_core::validation::{PasswordError, ValidationError};

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] craftly_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The current password given for a change didn't match.
    #[error("current password is incorrect")]
    WrongPassword,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("an account with this email already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error(transparent)]
    WeakPassword(#[from] PasswordError),

    /// Another registration field is invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
