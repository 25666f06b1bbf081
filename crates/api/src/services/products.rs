//! Product catalog workflows.

use tracing::instrument;

use dscommerce_core::ProductId;

use super::ServiceError;
use crate::db::{ProductStore, RepositoryError, Stores};
use crate::dto::{CategoryDto, Page, ProductDto, ProductMinDto};
use crate::models::PageRequest;

fn not_found(id: ProductId) -> ServiceError {
    ServiceError::NotFound(format!("product {id} not found"))
}

/// A write referenced a category that does not exist.
fn unknown_category(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::IntegrityViolation(_) => {
            ServiceError::NotFound("category not found".to_owned())
        }
        other => ServiceError::Repository(other),
    }
}

pub struct ProductService<'a> {
    products: &'a dyn ProductStore,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub fn new(stores: &'a Stores) -> Self {
        Self {
            products: stores.products.as_ref(),
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no product has this id.
    pub async fn find_by_id(&self, id: ProductId) -> Result<ProductDto, ServiceError> {
        let product = self
            .products
            .find_product(id)
            .await?
            .ok_or_else(|| not_found(id))?;

        Ok(ProductDto::from(&product))
    }

    /// Page through products whose name contains `name`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn find_all(
        &self,
        name: &str,
        page: &PageRequest,
    ) -> Result<Page<ProductMinDto>, ServiceError> {
        let (products, total) = self.products.search_products(name.trim(), page).await?;
        let content = products.iter().map(ProductMinDto::from).collect();
        Ok(Page::new(content, page, total))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if a category does not exist.
    #[instrument(skip(self, dto), fields(name = %dto.name))]
    pub async fn insert(&self, dto: &ProductDto) -> Result<ProductDto, ServiceError> {
        let product = self
            .products
            .insert_product(&dto.to_draft())
            .await
            .map_err(unknown_category)?;

        tracing::info!(product_id = %product.id, "product created");
        Ok(ProductDto::from(&product))
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product or a category does not exist.
    #[instrument(skip(self, dto))]
    pub async fn update(&self, id: ProductId, dto: &ProductDto) -> Result<ProductDto, ServiceError> {
        let product = self
            .products
            .update_product(id, &dto.to_draft())
            .await
            .map_err(unknown_category)?
            .ok_or_else(|| not_found(id))?;

        Ok(ProductDto::from(&product))
    }

    /// Delete a product that no order references.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the product does not exist.
    /// Returns `ServiceError::DatabaseIntegrity` if order items reference it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), ServiceError> {
        if !self.products.product_exists(id).await? {
            return Err(not_found(id));
        }

        match self.products.delete_product(id).await {
            Ok(()) => {
                tracing::info!(product_id = %id, "product deleted");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(not_found(id)),
            Err(RepositoryError::IntegrityViolation(_)) => Err(ServiceError::DatabaseIntegrity(
                "referential integrity failure".to_owned(),
            )),
            Err(other) => Err(ServiceError::Repository(other)),
        }
    }

    /// All categories, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn find_all_categories(&self) -> Result<Vec<CategoryDto>, ServiceError> {
        let categories = self.products.list_categories().await?;
        Ok(categories.iter().map(CategoryDto::from).collect())
    }
}
