//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health             - Liveness check
//! GET    /health/ready       - Readiness check (store reachable)
//!
//! # Auth
//! POST   /oauth2/token       - Password grant, returns a bearer token
//!
//! # Catalog
//! GET    /products           - Paged product search (?name=&page=&size=&sort=)
//! GET    /products/{id}      - Product detail
//! POST   /products           - Create product (admin)
//! PUT    /products/{id}      - Replace product (admin)
//! DELETE /products/{id}      - Delete product (admin)
//! GET    /categories         - All categories
//!
//! # Orders (requires auth)
//! GET    /orders/{id}        - Order detail (owner or admin)
//! POST   /orders             - Place an order
//!
//! # Users (requires auth)
//! GET    /users/me           - Own profile
//! ```

pub mod auth;
pub mod categories;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/{id}", get(orders::show))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/oauth2/token", post(auth::token))
        .nest("/products", product_routes())
        .route("/categories", get(categories::index))
        .nest("/orders", order_routes())
        .route("/users/me", get(users::me))
}
