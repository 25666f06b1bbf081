//! User route handlers.

use axum::{Json, extract::State};

use crate::dto::UserDto;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::UserService;
use crate::state::AppState;

/// `GET /users/me`
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
) -> Result<Json<UserDto>> {
    let user = UserService::new(state.stores()).me(&principal).await?;
    Ok(Json(user))
}
