//! Database access for the `shop` schema.
//!
//! # Tables
//!
//! - `shop.user`, `shop.user_role` - Accounts and their authorities
//! - `shop.access_token` - Hashed bearer tokens
//! - `shop.category`, `shop.product`, `shop.product_category` - Catalog
//! - `shop.sales_order`, `shop.order_item`, `shop.payment` - Orders
//!
//! # Store traits
//!
//! Services never see a pool. They talk to [`ProductStore`], [`OrderStore`],
//! and [`UserStore`]; the `Pg*Store` types implement them over `PostgreSQL`
//! and `mockall` generates `Mock*Store` doubles for tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p dscommerce-cli -- migrate
//! ```

pub mod orders;
pub mod products;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use dscommerce_core::{Email, OrderId, ProductId, UserId};

use crate::models::{
    Category, NewAccessToken, NewOrder, NewUser, Order, Product, ProductDraft, User,
    UserCredentials,
};
use crate::models::page::PageRequest;

pub use orders::PgOrderStore;
pub use products::PgProductStore;
pub use users::PgUserStore;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (e.g., duplicate email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Foreign key violation: the row is referenced elsewhere, or references
    /// a row that does not exist.
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),
}

impl RepositoryError {
    /// Classify a sqlx error, lifting constraint violations out of the
    /// generic database variant.
    pub(crate) fn from_sqlx(err: sqlx::Error, context: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::Conflict(context.to_owned());
            }
            if db_err.is_foreign_key_violation() {
                return Self::IntegrityViolation(context.to_owned());
            }
        }
        Self::Database(err)
    }
}

/// Catalog reads and writes.
#[automock]
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Fetch a product with its categories.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Case-insensitive name substring search. Returns the requested page and
    /// the total number of matches.
    async fn search_products(
        &self,
        name: &str,
        page: &PageRequest,
    ) -> Result<(Vec<Product>, u64), RepositoryError>;

    async fn product_exists(&self, id: ProductId) -> Result<bool, RepositoryError>;

    /// Insert a product and its category links.
    ///
    /// Unknown category ids surface as [`RepositoryError::IntegrityViolation`].
    async fn insert_product(&self, draft: &ProductDraft) -> Result<Product, RepositoryError>;

    /// Replace a product's fields and categories. `Ok(None)` if it does not exist.
    async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Delete a product.
    ///
    /// Returns [`RepositoryError::NotFound`] if no row was deleted and
    /// [`RepositoryError::IntegrityViolation`] if order items reference it.
    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError>;

    /// All categories, ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
}

/// Order reads and writes.
#[automock]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch an order with its client, items, and payment.
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Persist an order and its items in one transaction, returning the
    /// stored order with its generated id.
    async fn save_order(&self, order: &NewOrder) -> Result<Order, RepositoryError>;
}

/// Accounts and bearer tokens.
#[automock]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up a user and their password hash by login email.
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, RepositoryError>;

    /// Create a user with roles. Duplicate emails are [`RepositoryError::Conflict`].
    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Store a new token and drop every token that has already expired.
    async fn save_access_token(&self, token: &NewAccessToken) -> Result<(), RepositoryError>;

    /// Resolve a token hash to its user, ignoring tokens expired at `now`.
    async fn find_user_by_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError>;
}

/// The set of stores handed to services through application state.
#[derive(Clone)]
pub struct Stores {
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
    pub users: Arc<dyn UserStore>,
    pool: Option<PgPool>,
}

impl Stores {
    /// Bundle arbitrary store implementations (test doubles, mostly).
    #[must_use]
    pub fn new(
        products: Arc<dyn ProductStore>,
        orders: Arc<dyn OrderStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            products,
            orders,
            users,
            pool: None,
        }
    }

    /// `PostgreSQL`-backed stores sharing one pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            products: Arc::new(PgProductStore::new(pool.clone())),
            orders: Arc::new(PgOrderStore::new(pool.clone())),
            users: Arc::new(PgUserStore::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Connectivity probe for readiness checks. Always succeeds when the
    /// stores are not database-backed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the database is unreachable.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores")
            .field("postgres", &self.pool.is_some())
            .finish_non_exhaustive()
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
