//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] stitchline_core::EmailError),

    /// Invalid credentials (wrong password, unknown or malformed email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session points at an account that no longer exists.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// A required profile field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Reset code did not match, was never issued, or has expired.
    #[error("invalid or expired reset code")]
    InvalidResetCode,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
