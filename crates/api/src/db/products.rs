//! Catalog store over `shop.product` and `shop.category`.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use dscommerce_core::{CategoryId, ProductId};

use super::{ProductStore, RepositoryError};
use crate::models::page::PageRequest;
use crate::models::{Category, Product, ProductDraft};

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price: Decimal,
    img_url: Option<String>,
}

impl ProductRow {
    fn into_product(self, categories: Vec<Category>) -> Product {
        Product {
            id: ProductId::new(self.id),
            name: self.name,
            description: self.description,
            price: self.price,
            img_url: self.img_url,
            categories,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductCategoryRow {
    product_id: i64,
    id: i64,
    name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            name: row.name,
        }
    }
}

/// Escape `LIKE` metacharacters so user input only ever matches literally.
fn like_pattern(name: &str) -> String {
    let mut pattern = String::with_capacity(name.len() + 2);
    pattern.push('%');
    for c in name.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `PostgreSQL` implementation of [`ProductStore`].
#[derive(Debug, Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load categories for a batch of products, keyed by product id.
    async fn categories_for(
        &self,
        ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Category>>, RepositoryError> {
        let rows = sqlx::query_as::<Postgres, ProductCategoryRow>(
            r"
            SELECT pc.product_id, c.id, c.name
            FROM shop.product_category pc
            JOIN shop.category c ON c.id = pc.category_id
            WHERE pc.product_id = ANY($1)
            ORDER BY c.name
            ",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_product: HashMap<i64, Vec<Category>> = HashMap::new();
        for row in rows {
            by_product.entry(row.product_id).or_default().push(Category {
                id: CategoryId::new(row.id),
                name: row.name,
            });
        }
        Ok(by_product)
    }

    async fn replace_categories(
        tx: &mut Transaction<'_, Postgres>,
        product_id: i64,
        categories: &[CategoryId],
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shop.product_category WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut **tx)
            .await?;

        let ids: Vec<i64> = categories.iter().map(|id| id.as_i64()).collect();
        sqlx::query(
            r"
            INSERT INTO shop.product_category (product_id, category_id)
            SELECT $1, category_id FROM UNNEST($2::BIGINT[]) AS t(category_id)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(product_id)
        .bind(&ids)
        .execute(&mut **tx)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "unknown category"))?;

        Ok(())
    }

    async fn load(&self, row: ProductRow) -> Result<Product, RepositoryError> {
        let mut categories = self.categories_for(&[row.id]).await?;
        let own = categories.remove(&row.id).unwrap_or_default();
        Ok(row.into_product(own))
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<Postgres, ProductRow>(
            r"
            SELECT id, name, description, price, img_url
            FROM shop.product
            WHERE id = $1
            ",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load(row).await?)),
            None => Ok(None),
        }
    }

    async fn search_products(
        &self,
        name: &str,
        page: &PageRequest,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        let pattern = like_pattern(name);

        let total: i64 = sqlx::query_scalar(
            r"SELECT COUNT(*) FROM shop.product WHERE UPPER(name) LIKE UPPER($1) ESCAPE '\'",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        // Sort column and direction come from closed enums, never from input.
        let sql = format!(
            r"
            SELECT id, name, description, price, img_url
            FROM shop.product
            WHERE UPPER(name) LIKE UPPER($1) ESCAPE '\'
            ORDER BY {} {}, id
            LIMIT $2 OFFSET $3
            ",
            page.sort.field.column(),
            page.sort.direction.keyword(),
        );

        let offset = i64::try_from(page.offset())
            .map_err(|_| RepositoryError::DataCorruption("page offset overflow".to_owned()))?;

        let rows = sqlx::query_as::<Postgres, ProductRow>(&sql)
            .bind(&pattern)
            .bind(i64::from(page.size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut categories = self.categories_for(&ids).await?;

        let products = rows
            .into_iter()
            .map(|row| {
                let own = categories.remove(&row.id).unwrap_or_default();
                row.into_product(own)
            })
            .collect();

        let total = u64::try_from(total)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count: {total}")))?;

        Ok((products, total))
    }

    async fn product_exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shop.product WHERE id = $1)")
                .bind(id.as_i64())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert_product(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<Postgres, ProductRow>(
            r"
            INSERT INTO shop.product (name, description, price, img_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, price, img_url
            ",
        )
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.img_url.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_categories(&mut tx, row.id, &draft.categories).await?;
        tx.commit().await?;

        self.load(row).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<Postgres, ProductRow>(
            r"
            UPDATE shop.product
            SET name = $2, description = $3, price = $4, img_url = $5
            WHERE id = $1
            RETURNING id, name, description, price, img_url
            ",
        )
        .bind(id.as_i64())
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(draft.price)
        .bind(draft.img_url.as_deref())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Self::replace_categories(&mut tx, row.id, &draft.categories).await?;
        tx.commit().await?;

        Ok(Some(self.load(row).await?))
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx(e, "product is referenced by orders"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<Postgres, CategoryRow>(
            "SELECT id, name FROM shop.category ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }
}
