//! Product route handlers.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;

use dscommerce_core::ProductId;

use crate::dto::{Page, ProductDto, ProductMinDto};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, ValidatedJson, ValidatedPath};
use crate::models::{PageRequest, Sort, page::DEFAULT_PAGE_SIZE};
use crate::services::ProductService;
use crate::state::AppState;

/// Query string of `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub name: String,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

impl ProductQuery {
    fn page_request(&self) -> Result<PageRequest> {
        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") => Sort::default(),
            Some(raw) => raw
                .parse::<Sort>()
                .map_err(|e| AppError::BadRequest(e.to_string()))?,
        };
        Ok(PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
            sort,
        ))
    }
}

/// `GET /products`
pub async fn index(
    State(state): State<AppState>,
    query: std::result::Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Json<Page<ProductMinDto>>> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let page = query.page_request()?;

    let products = ProductService::new(state.stores())
        .find_all(&query.name, &page)
        .await?;
    Ok(Json(products))
}

/// `GET /products/{id}`
pub async fn show(
    State(state): State<AppState>,
    ValidatedPath(id): ValidatedPath<ProductId>,
) -> Result<Json<ProductDto>> {
    let product = ProductService::new(state.stores()).find_by_id(id).await?;
    Ok(Json(product))
}

/// `POST /products`
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedJson(body): ValidatedJson<ProductDto>,
) -> Result<impl IntoResponse> {
    let product = ProductService::new(state.stores()).insert(&body).await?;

    let location = product
        .id
        .map(|id| format!("/products/{id}"))
        .unwrap_or_default();
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(product),
    ))
}

/// `PUT /products/{id}`
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedPath(id): ValidatedPath<ProductId>,
    ValidatedJson(body): ValidatedJson<ProductDto>,
) -> Result<Json<ProductDto>> {
    let product = ProductService::new(state.stores())
        .update(id, &body)
        .await?;
    Ok(Json(product))
}

/// `DELETE /products/{id}`
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ValidatedPath(id): ValidatedPath<ProductId>,
) -> Result<StatusCode> {
    ProductService::new(state.stores()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
