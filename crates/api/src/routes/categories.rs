//! Category route handlers.

use axum::{Json, extract::State};

use crate::dto::CategoryDto;
use crate::error::Result;
use crate::services::ProductService;
use crate::state::AppState;

/// `GET /categories`
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<CategoryDto>>> {
    let categories = ProductService::new(state.stores())
        .find_all_categories()
        .await?;
    Ok(Json(categories))
}
