//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # A client account
//! dsc-cli user create -e maria@gmail.com -n "Maria Brown" -p 123456
//!
//! # An account with both roles
//! dsc-cli user create -e alex@gmail.com -n "Alex Green" -p 123456 -r client -r admin
//! ```

use thiserror::Error;

use dscommerce_api::db::{self, PgUserStore, RepositoryError, UserStore};
use dscommerce_api::models::NewUser;
use dscommerce_api::services::auth::hash_password;
use dscommerce_core::{Email, Role, RoleSet, UserId};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: API_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: client, admin")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Password hashing failed")]
    PasswordHash,

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

/// Parse role names such as `client` or `ROLE_ADMIN`.
fn parse_roles(raw: &[String]) -> Result<RoleSet, UserError> {
    raw.iter()
        .map(|r| r.parse::<Role>().map_err(|_| UserError::InvalidRole(r.clone())))
        .collect()
}

/// Create a new user.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `UserError` if an argument is invalid, the email is taken, or the
/// database is unreachable.
pub async fn create(
    email: &str,
    name: &str,
    password: &str,
    roles: &[String],
) -> Result<UserId, UserError> {
    let roles = parse_roles(roles)?;
    let email = Email::parse(email).map_err(|_| UserError::InvalidEmail(email.to_owned()))?;
    if password.is_empty() {
        return Err(UserError::EmptyPassword);
    }
    let password_hash = hash_password(password).map_err(|_| UserError::PasswordHash)?;

    let database_url = super::database_url().ok_or(UserError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Creating user: {}", email);

    let user = PgUserStore::new(pool)
        .create_user(&NewUser {
            name: name.trim().to_owned(),
            email: email.clone(),
            phone: None,
            birth_date: None,
            password_hash,
            roles,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::UserExists(email.to_string()),
            other => UserError::Repository(other),
        })?;

    let authorities: Vec<&str> = user.roles.iter().map(Role::authority).collect();
    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Roles: {}",
        user.id,
        user.email,
        authorities.join(", ")
    );

    Ok(user.id)
}
