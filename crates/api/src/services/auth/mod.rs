//! Authentication service.
//!
//! Issues opaque bearer tokens for the OAuth2 password grant and resolves
//! them back to users. Tokens are 32 random bytes, base64url encoded; only
//! their SHA-256 digest is persisted.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use dscommerce_core::{Email, Principal, UserId, ensure_self_or_admin};

use crate::db::UserStore;
use crate::models::{NewAccessToken, User};

/// The only grant type `POST /oauth2/token` accepts.
pub const PASSWORD_GRANT: &str = "password";

/// Number of random bytes in a bearer token.
const TOKEN_BYTES: usize = 32;

/// A freshly issued bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The raw token. Returned to the client once and never stored.
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
    token_ttl: Duration,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(users: &'a dyn UserStore, token_ttl: Duration) -> Self {
        Self { users, token_ttl }
    }

    /// Exchange a username (email) and password for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnsupportedGrantType` unless `grant_type` is `password`.
    /// Returns `AuthError::InvalidCredentials` if the user is unknown or the
    /// password does not match.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(
        &self,
        grant_type: &str,
        username: &str,
        password: &str,
    ) -> Result<IssuedToken, AuthError> {
        if grant_type != PASSWORD_GRANT {
            return Err(AuthError::UnsupportedGrantType(grant_type.to_owned()));
        }

        let email = Email::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let credentials = self
            .users
            .find_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &credentials.password_hash)?;

        let access_token = generate_token();
        self.users
            .save_access_token(&NewAccessToken {
                token_hash: hash_token(&access_token),
                user_id: credentials.user.id,
                expires_at: Utc::now() + self.token_ttl,
            })
            .await?;

        tracing::info!(user_id = %credentials.user.id, "access token issued");

        Ok(IssuedToken {
            access_token,
            expires_in: self.token_ttl.num_seconds(),
        })
    }

    /// Resolve a bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown or expired.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        self.users
            .find_user_by_token(&hash_token(token), Utc::now())
            .await?
            .ok_or(AuthError::InvalidToken)
    }
}

/// Allow the request if the principal is `target` or an admin.
///
/// # Errors
///
/// Returns `AuthError::Forbidden` otherwise.
pub fn validate_self_or_admin(principal: &Principal, target: UserId) -> Result<(), AuthError> {
    ensure_self_or_admin(principal, target)?;
    Ok(())
}

/// Generate a new random bearer token.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest under which a token is stored.
#[must_use]
pub fn hash_token(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the hash is malformed or the
/// password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
