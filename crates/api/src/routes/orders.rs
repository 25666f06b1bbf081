//! Order route handlers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};

use dscommerce_core::OrderId;

use crate::dto::{NewOrderRequest, OrderDto};
use crate::error::Result;
use crate::middleware::{RequireAuth, ValidatedJson, ValidatedPath};
use crate::services::OrderService;
use crate::state::AppState;

/// `GET /orders/{id}`
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ValidatedPath(id): ValidatedPath<OrderId>,
) -> Result<Json<OrderDto>> {
    let order = OrderService::new(state.stores())
        .find_by_id(&principal, id)
        .await?;
    Ok(Json(order))
}

/// `POST /orders`
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ValidatedJson(request): ValidatedJson<NewOrderRequest>,
) -> Result<impl IntoResponse> {
    let order = OrderService::new(state.stores())
        .insert(&principal, &request)
        .await?;

    let location = format!("/orders/{}", order.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(order),
    ))
}
