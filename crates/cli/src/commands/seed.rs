//! Seed the database with fixture data.
//!
//! Reads categories, products, users, orders and payments from a YAML file
//! and inserts them with their fixture ids in one transaction. Identity
//! sequences are advanced past the highest seeded id afterwards, so rows
//! created through the API never collide with fixtures.
//!
//! ```yaml
//! categories:
//!   - { id: 1, name: Livros }
//! users:
//!   - id: 1
//!     name: Maria Brown
//!     email: maria@gmail.com
//!     password: "123456"
//!     roles: [client]
//! products:
//!   - id: 1
//!     name: The Lord of the Rings
//!     description: ...
//!     price: 90.5
//!     categories: [1]
//! orders:
//!   - id: 1
//!     moment: 2022-07-25T13:00:00Z
//!     status: PAID
//!     client: 1
//!     items: [{ product: 1, quantity: 2, price: 90.5 }]
//!     payment: 2022-07-25T15:00:00Z
//! ```

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{Postgres, Transaction};
use thiserror::Error;
use tracing::info;

use dscommerce_api::db;
use dscommerce_api::services::auth::hash_password;
use dscommerce_core::{Email, OrderStatus, Role, RoleSet};

/// Tables in dependency order; truncation and sequence resets walk this list.
const TABLES: [&str; 4] = ["shop.user", "shop.category", "shop.product", "shop.sales_order"];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: API_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid fixture file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid fixture: {0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    categories: Vec<CategoryFixture>,
    #[serde(default)]
    users: Vec<UserFixture>,
    #[serde(default)]
    products: Vec<ProductFixture>,
    #[serde(default)]
    orders: Vec<OrderFixture>,
}

#[derive(Debug, Deserialize)]
struct CategoryFixture {
    id: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct UserFixture {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    birth_date: Option<NaiveDate>,
    password: String,
    roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProductFixture {
    id: i64,
    name: String,
    description: String,
    price: Decimal,
    img_url: Option<String>,
    #[serde(default)]
    categories: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct OrderFixture {
    id: i64,
    moment: DateTime<Utc>,
    status: OrderStatus,
    client: i64,
    items: Vec<OrderItemFixture>,
    payment: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct OrderItemFixture {
    product: i64,
    quantity: i32,
    price: Decimal,
}

/// Check cross references and per-row rules before touching the database.
fn validate(fixture: &Fixture) -> Vec<String> {
    let mut errors = Vec::new();

    let categories: HashSet<i64> = fixture.categories.iter().map(|c| c.id).collect();
    let users: HashSet<i64> = fixture.users.iter().map(|u| u.id).collect();
    let products: HashSet<i64> = fixture.products.iter().map(|p| p.id).collect();

    for user in &fixture.users {
        if Email::parse(&user.email).is_err() {
            errors.push(format!("user {}: invalid email {:?}", user.id, user.email));
        }
        if user.roles.is_empty() {
            errors.push(format!("user {}: no roles", user.id));
        }
        for role in &user.roles {
            if role.parse::<Role>().is_err() {
                errors.push(format!("user {}: invalid role {role:?}", user.id));
            }
        }
    }

    for product in &fixture.products {
        if product.price <= Decimal::ZERO {
            errors.push(format!("product {}: price must be positive", product.id));
        }
        if product.categories.is_empty() {
            errors.push(format!("product {}: no categories", product.id));
        }
        for category in &product.categories {
            if !categories.contains(category) {
                errors.push(format!("product {}: unknown category {category}", product.id));
            }
        }
    }

    for order in &fixture.orders {
        if !users.contains(&order.client) {
            errors.push(format!("order {}: unknown client {}", order.id, order.client));
        }
        if order.items.is_empty() {
            errors.push(format!("order {}: no items", order.id));
        }
        let mut seen = HashSet::new();
        for item in &order.items {
            if !products.contains(&item.product) {
                errors.push(format!("order {}: unknown product {}", order.id, item.product));
            }
            if !seen.insert(item.product) {
                errors.push(format!("order {}: product {} listed twice", order.id, item.product));
            }
            if item.quantity <= 0 {
                errors.push(format!("order {}: quantity must be positive", order.id));
            }
        }
    }

    errors
}

/// Seed fixture data from a YAML file.
///
/// # Arguments
///
/// * `file_path` - Path to the YAML fixture file
/// * `reset` - If true, truncate all shop tables first
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or any insert fails.
/// Nothing is written unless every row succeeds.
pub async fn run(file_path: &str, reset: bool) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading fixtures from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let fixture: Fixture = serde_yaml::from_str(&content)?;

    let errors = validate(&fixture);
    if !errors.is_empty() {
        for err in &errors {
            tracing::error!("  - {err}");
        }
        return Err(SeedError::Invalid(format!(
            "{} validation errors found",
            errors.len()
        )));
    }

    let database_url = super::database_url().ok_or(SeedError::MissingDatabaseUrl)?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let mut tx = pool.begin().await?;

    if reset {
        info!("Truncating shop tables");
        sqlx::query(&format!(
            "TRUNCATE {}, shop.access_token RESTART IDENTITY CASCADE",
            TABLES.join(", ")
        ))
        .execute(&mut *tx)
        .await?;
    }

    seed_categories(&mut tx, &fixture.categories).await?;
    seed_users(&mut tx, &fixture.users).await?;
    seed_products(&mut tx, &fixture.products).await?;
    seed_orders(&mut tx, &fixture.orders).await?;

    for table in TABLES {
        sqlx::query(&format!(
            "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
             (SELECT COALESCE(MAX(id), 0) + 1 FROM {table}), false)"
        ))
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!("Seeding complete!");
    info!("  Categories: {}", fixture.categories.len());
    info!("  Users: {}", fixture.users.len());
    info!("  Products: {}", fixture.products.len());
    info!("  Orders: {}", fixture.orders.len());

    Ok(())
}

async fn seed_categories(
    tx: &mut Transaction<'_, Postgres>,
    categories: &[CategoryFixture],
) -> Result<(), SeedError> {
    for category in categories {
        sqlx::query("INSERT INTO shop.category (id, name) VALUES ($1, $2)")
            .bind(category.id)
            .bind(&category.name)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn seed_users(
    tx: &mut Transaction<'_, Postgres>,
    users: &[UserFixture],
) -> Result<(), SeedError> {
    for user in users {
        let email = Email::parse(&user.email)
            .map_err(|e| SeedError::Invalid(format!("user {}: {e}", user.id)))?;
        let roles = user
            .roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<RoleSet, _>>()
            .map_err(|e| SeedError::Invalid(format!("user {}: {e}", user.id)))?;
        let password_hash = hash_password(&user.password)
            .map_err(|e| SeedError::Invalid(format!("user {}: {e}", user.id)))?;

        sqlx::query(
            r"
            INSERT INTO shop.user (id, name, email, phone, birth_date, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(email.as_str())
        .bind(user.phone.as_deref())
        .bind(user.birth_date)
        .bind(&password_hash)
        .execute(&mut **tx)
        .await?;

        for role in roles.iter() {
            sqlx::query("INSERT INTO shop.user_role (user_id, authority) VALUES ($1, $2)")
                .bind(user.id)
                .bind(role.authority())
                .execute(&mut **tx)
                .await?;
        }
    }
    Ok(())
}

async fn seed_products(
    tx: &mut Transaction<'_, Postgres>,
    products: &[ProductFixture],
) -> Result<(), SeedError> {
    for product in products {
        sqlx::query(
            r"
            INSERT INTO shop.product (id, name, description, price, img_url)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.img_url.as_deref())
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO shop.product_category (product_id, category_id)
            SELECT $1, UNNEST($2::BIGINT[])
            ",
        )
        .bind(product.id)
        .bind(&product.categories)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn seed_orders(
    tx: &mut Transaction<'_, Postgres>,
    orders: &[OrderFixture],
) -> Result<(), SeedError> {
    for order in orders {
        sqlx::query(
            r"
            INSERT INTO shop.sales_order (id, moment, status, client_id)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(order.id)
        .bind(order.moment)
        .bind(order.status)
        .bind(order.client)
        .execute(&mut **tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r"
                INSERT INTO shop.order_item (order_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order.id)
            .bind(item.product)
            .bind(item.quantity)
            .bind(item.price)
            .execute(&mut **tx)
            .await?;
        }

        if let Some(moment) = order.payment {
            sqlx::query("INSERT INTO shop.payment (order_id, moment) VALUES ($1, $2)")
                .bind(order.id)
                .bind(moment)
                .execute(&mut **tx)
                .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BUNDLED: &str = include_str!("../../fixtures/seed.yaml");

    #[test]
    fn test_bundled_fixture_is_valid() {
        let fixture: Fixture = serde_yaml::from_str(BUNDLED).unwrap();
        assert!(validate(&fixture).is_empty());
        assert!(!fixture.orders.is_empty());
    }

    #[test]
    fn test_validate_reports_dangling_references() {
        let fixture: Fixture = serde_yaml::from_str(
            r"
categories:
  - { id: 1, name: Livros }
products:
  - { id: 1, name: Book, description: A long enough text, price: 10.0, categories: [9] }
orders:
  - id: 1
    moment: 2022-07-25T13:00:00Z
    status: PAID
    client: 7
    items: [{ product: 1, quantity: 0, price: 10.0 }]
",
        )
        .unwrap();

        let errors = validate(&fixture);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("unknown category 9")));
        assert!(errors.iter().any(|e| e.contains("unknown client 7")));
        assert!(errors.iter().any(|e| e.contains("quantity must be positive")));
    }

    #[test]
    fn test_status_uses_wire_spelling() {
        let order: OrderFixture = serde_yaml::from_str(
            "{ id: 3, moment: 2022-08-03T14:20:00Z, status: WAITING_PAYMENT, client: 1, items: [] }",
        )
        .unwrap();
        assert_eq!(order.status, OrderStatus::WaitingPayment);
        assert!(order.payment.is_none());
    }
}
