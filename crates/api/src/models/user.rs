//! User domain types.

use chrono::{DateTime, NaiveDate, Utc};

use dscommerce_core::{Email, Principal, RoleSet, UserId};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    /// Display name shown on orders.
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub roles: RoleSet,
}

impl User {
    /// The principal this user authenticates as.
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.roles.clone())
    }
}

/// A user together with their stored password hash (login path only).
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    /// Argon2 PHC string.
    pub password_hash: String,
}

/// Parameters for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub password_hash: String,
    pub roles: RoleSet,
}

/// A bearer token about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccessToken {
    /// SHA-256 of the token, base64url encoded. The raw token is never stored.
    pub token_hash: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}
