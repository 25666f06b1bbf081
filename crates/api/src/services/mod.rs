//! Business workflows.
//!
//! Services borrow the stores from [`Stores`](crate::db::Stores) and take the
//! authenticated [`Principal`](dscommerce_core::Principal) as an explicit
//! argument where a workflow needs one.

pub mod auth;
pub mod orders;
pub mod products;
pub mod users;

pub use auth::{AuthError, AuthService};
pub use orders::OrderService;
pub use products::ProductService;
pub use users::UserService;

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors raised by the catalog and order workflows.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A referenced resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The operation would break a referential constraint.
    #[error("{0}")]
    DatabaseIntegrity(String),

    /// Authorization failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
