//! Catalog projections and the product write body.

use std::borrow::Cow;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use dscommerce_core::{CategoryId, ProductId};

use crate::models::{Category, Product, ProductDraft};

/// Prices are stored as `NUMERIC(12, 2)`.
const MAX_PRICE_SCALE: u32 = 2;

/// Smallest price that no longer fits `NUMERIC(12, 2)`.
const PRICE_LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

fn positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if !price.is_sign_positive() || price.is_zero() {
        return Err(ValidationError::new("positive")
            .with_message(Cow::Borrowed("price must be positive")));
    }
    if price.normalize().scale() > MAX_PRICE_SCALE {
        return Err(ValidationError::new("scale")
            .with_message(Cow::Borrowed("price must have at most 2 decimal places")));
    }
    if *price >= PRICE_LIMIT {
        return Err(ValidationError::new("range")
            .with_message(Cow::Borrowed("price must be less than 10000000000")));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDto {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
}

impl From<&Category> for CategoryDto {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
        }
    }
}

/// Full product representation, used both as response and as the body of
/// `POST /products` and `PUT /products/{id}`. The `id` of a request body is
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    #[serde(default)]
    pub id: Option<ProductId>,
    #[validate(length(min = 3, max = 80, message = "name must have 3 to 80 characters"))]
    pub name: String,
    #[validate(length(min = 10, message = "description must have at least 10 characters"))]
    pub description: String,
    /// A missing price decodes as zero and is rejected by validation.
    #[serde(default, with = "rust_decimal::serde::float")]
    #[validate(custom(function = "positive_price"))]
    pub price: Decimal,
    #[serde(default)]
    pub img_url: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "product must have at least one category"))]
    pub categories: Vec<CategoryDto>,
}

impl ProductDto {
    /// The writable fields of this body.
    #[must_use]
    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            name: self.name.trim().to_owned(),
            description: self.description.clone(),
            price: self.price,
            img_url: self.img_url.clone().filter(|url| !url.trim().is_empty()),
            categories: self.categories.iter().map(|c| c.id).collect(),
        }
    }
}

impl From<&Product> for ProductDto {
    fn from(product: &Product) -> Self {
        Self {
            id: Some(product.id),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            img_url: product.img_url.clone(),
            categories: product.categories.iter().map(CategoryDto::from).collect(),
        }
    }
}

/// Listing projection used by `GET /products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductMinDto {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub img_url: Option<String>,
}

impl From<&Product> for ProductMinDto {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            img_url: product.img_url.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn body() -> ProductDto {
        serde_json::from_str(
            r#"{
                "name": "PlayStation 5",
                "description": "Next generation console",
                "price": 3999.9,
                "imgUrl": "https://img.example.com/ps5.png",
                "categories": [{"id": 2}]
            }"#,
        )
        .unwrap()
    }

    fn invalid_fields(dto: &ProductDto) -> Vec<String> {
        let mut fields: Vec<String> = dto
            .validate()
            .unwrap_err()
            .field_errors()
            .keys()
            .map(ToString::to_string)
            .collect();
        fields.sort();
        fields
    }

    #[test]
    fn test_valid_body_passes() {
        let dto = body();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.id, None);
        assert_eq!(dto.price, "3999.9".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_short_name_and_description_are_rejected() {
        let mut dto = body();
        dto.name = "PS".to_owned();
        dto.description = "short".to_owned();
        assert_eq!(invalid_fields(&dto), vec!["description", "name"]);
    }

    #[test]
    fn test_missing_or_negative_price_is_rejected() {
        let dto: ProductDto = serde_json::from_str(
            r#"{"name": "Console", "description": "A console for games", "categories": [{"id": 1}]}"#,
        )
        .unwrap();
        assert_eq!(invalid_fields(&dto), vec!["price"]);

        let mut dto = body();
        dto.price = "-1".parse().unwrap();
        assert_eq!(invalid_fields(&dto), vec!["price"]);
    }

    #[test]
    fn test_price_must_fit_the_price_column() {
        let mut dto = body();
        dto.price = "0.001".parse().unwrap();
        assert_eq!(invalid_fields(&dto), vec!["price"]);

        dto.price = "99999999999.5".parse().unwrap();
        assert_eq!(invalid_fields(&dto), vec!["price"]);

        dto.price = "10000000000".parse().unwrap();
        assert_eq!(invalid_fields(&dto), vec!["price"]);

        dto.price = "9999999999.99".parse().unwrap();
        assert!(dto.validate().is_ok());

        // Trailing zeros are not extra precision
        dto.price = "12.500".parse().unwrap();
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_price_limit_is_ten_billion() {
        assert_eq!(PRICE_LIMIT, Decimal::from(10_000_000_000_i64));
    }

    #[test]
    fn test_product_without_categories_is_rejected() {
        let mut dto = body();
        dto.categories.clear();
        assert_eq!(invalid_fields(&dto), vec!["categories"]);
    }

    #[test]
    fn test_draft_drops_blank_image_url() {
        let mut dto = body();
        dto.img_url = Some("  ".to_owned());
        let draft = dto.to_draft();
        assert_eq!(draft.img_url, None);
        assert_eq!(draft.categories, vec![CategoryId::new(2)]);
    }

    #[test]
    fn test_min_dto_json_shape() {
        let product = Product {
            id: ProductId::new(3),
            name: "Macbook Pro".to_owned(),
            description: "Lorem ipsum dolor sit amet".to_owned(),
            price: "1250.00".parse().unwrap(),
            img_url: Some("3-big.jpg".to_owned()),
            categories: vec![],
        };
        let json = serde_json::to_value(ProductMinDto::from(&product)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 3, "name": "Macbook Pro", "price": 1250.0, "imgUrl": "3-big.jpg"})
        );
    }
}
