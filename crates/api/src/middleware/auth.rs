//! Bearer token extractors.
//!
//! [`RequireAuth`] resolves `Authorization: Bearer <token>` to a
//! [`Principal`]; [`RequireAdmin`] additionally requires the admin role.
//! Both run before any body extractor, so an unauthenticated request is
//! rejected with 401 before its body is looked at.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use dscommerce_core::Principal;

use crate::error::{AppError, set_sentry_user};
use crate::services::AuthService;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(principal): RequireAuth) -> String {
///     format!("Hello, user {}!", principal.id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Principal);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already resolved by another extractor on this request
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(Self(principal.clone()));
        }

        let token = bearer_token(parts).ok_or_else(|| {
            AppError::Unauthorized("Full authentication is required".to_string())
        })?;

        let auth = AuthService::new(state.stores().users.as_ref(), state.config().token_ttl());
        let user = auth.authenticate(token).await?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        tracing::Span::current().record("user_id", user.id.as_i64());

        let principal = user.principal();
        parts.extensions.insert(principal.clone());
        Ok(Self(principal))
    }
}

/// Extractor that requires a valid bearer token held by an admin.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub Principal);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(principal) = RequireAuth::from_request_parts(parts, state).await?;

        if !principal.is_admin() {
            tracing::warn!(user_id = %principal.id, path = %parts.uri.path(), "admin role required");
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        Ok(Self(principal))
    }
}

/// The token of an `Authorization: Bearer` header, if present and non-empty.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
