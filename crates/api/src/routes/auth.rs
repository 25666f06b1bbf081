//! Token endpoint.

use axum::{
    Form, Json,
    extract::{State, rejection::FormRejection},
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::services::AuthService;
use crate::state::AppState;

/// Form body of `POST /oauth2/token`.
#[derive(Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub username: String,
    pub password: String,
}

/// Successful token response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// `POST /oauth2/token`
pub async fn token(
    State(state): State<AppState>,
    form: std::result::Result<Form<TokenRequest>, FormRejection>,
) -> Result<Json<TokenResponse>> {
    let Form(form) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let issued = AuthService::new(state.stores().users.as_ref(), state.config().token_ttl())
        .login(&form.grant_type, &form.username, &form.password)
        .await?;

    Ok(Json(TokenResponse {
        access_token: issued.access_token,
        token_type: "Bearer",
        expires_in: issued.expires_in,
    }))
}
