//! Catalog domain types.

use rust_decimal::Decimal;

use dscommerce_core::{CategoryId, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A catalog product with its categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Current unit price. Order items snapshot this at order time.
    pub price: Decimal,
    pub img_url: Option<String>,
    pub categories: Vec<Category>,
}

/// Validated product fields for insert and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub img_url: Option<String>,
    pub categories: Vec<CategoryId>,
}
