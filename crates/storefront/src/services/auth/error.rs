//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid credentials (wrong password, unknown email, or no password set).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The customer has been deactivated.
    #[error("account is inactive")]
    InactiveAccount,

    /// Customer already exists.
    #[error("customer already exists")]
    AlreadyExists,

    /// Request body failed validation.
    #[error("{0}")]
    Validation(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
