//! Authentication error types.

use thiserror::Error;

use dscommerce_core::AccessDenied;

use crate::db::RepositoryError;

/// Errors that can occur during authentication and authorization.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong password, unknown user, or malformed username.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Bearer token is unknown or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Only the password grant is supported.
    #[error("unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    /// The principal may not access the resource.
    #[error("access denied")]
    Forbidden(#[from] AccessDenied),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
