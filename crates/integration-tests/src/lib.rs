//! Test harness for driving the DSCommerce router end to end.
//!
//! [`InMemoryShop`] implements every store trait over a mutex-guarded copy of
//! the development fixtures (`crates/cli/fixtures/seed.yaml`), so the tests
//! exercise routing, extractors, services, and error rendering without a
//! database. Requests go through [`TestApp::send`], which calls the router
//! with `tower::ServiceExt::oneshot`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p dscommerce-integration-tests
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use dscommerce_api::db::{OrderStore, ProductStore, RepositoryError, UserStore};
use dscommerce_api::models::{
    Category, NewAccessToken, NewOrder, NewUser, Order, OrderClient, OrderItem, PageRequest,
    Payment, Product, ProductDraft, SortDirection, SortField, User, UserCredentials,
};
use dscommerce_api::services::auth::{generate_token, hash_password, hash_token};
use dscommerce_api::{ApiConfig, AppState, Stores};
use dscommerce_core::{
    CategoryId, Email, OrderId, OrderStatus, ProductId, Role, RoleSet, UserId,
};

/// Password of every fixture account.
pub const PASSWORD: &str = "123456";

/// Client with orders 1 and 3.
pub const MARIA: &str = "maria@gmail.com";
/// Client and admin, owner of order 2.
pub const ALEX: &str = "alex@gmail.com";
/// Admin only, no orders.
pub const ANA: &str = "ana@gmail.com";

/// Largest body the harness will buffer.
const BODY_LIMIT: usize = 1024 * 1024;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Argon2 is slow on purpose; hash the shared fixture password once.
fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).unwrap_or_default())
        .clone()
}

fn dec(raw: &str) -> Decimal {
    raw.parse().unwrap_or_default()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Debug, Clone)]
struct StoredProduct {
    id: ProductId,
    name: String,
    description: String,
    price: Decimal,
    img_url: Option<String>,
    categories: Vec<CategoryId>,
}

#[derive(Debug, Clone)]
struct StoredOrder {
    moment: DateTime<Utc>,
    status: OrderStatus,
    client: UserId,
    items: Vec<(ProductId, i32, Decimal)>,
    payment: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<CategoryId, String>,
    users: BTreeMap<UserId, StoredUser>,
    products: BTreeMap<ProductId, StoredProduct>,
    orders: BTreeMap<OrderId, StoredOrder>,
    tokens: BTreeMap<String, (UserId, DateTime<Utc>)>,
}

impl Tables {
    fn product(&self, stored: &StoredProduct) -> Product {
        let mut categories: Vec<Category> = stored
            .categories
            .iter()
            .filter_map(|id| {
                self.categories.get(id).map(|name| Category {
                    id: *id,
                    name: name.clone(),
                })
            })
            .collect();
        categories.sort_by_key(|c| c.id);

        Product {
            id: stored.id,
            name: stored.name.clone(),
            description: stored.description.clone(),
            price: stored.price,
            img_url: stored.img_url.clone(),
            categories,
        }
    }

    fn order(&self, id: OrderId, stored: &StoredOrder) -> Result<Order, RepositoryError> {
        let client = self
            .users
            .get(&stored.client)
            .ok_or_else(|| RepositoryError::DataCorruption("order without client".to_owned()))?;

        let mut items = Vec::with_capacity(stored.items.len());
        for &(product_id, quantity, price) in &stored.items {
            let product = self.products.get(&product_id).ok_or_else(|| {
                RepositoryError::DataCorruption("item without product".to_owned())
            })?;
            items.push(OrderItem {
                product_id,
                name: product.name.clone(),
                img_url: product.img_url.clone(),
                quantity,
                price,
            });
        }
        items.sort_by_key(|item| item.product_id);

        Ok(Order {
            id,
            moment: stored.moment,
            status: stored.status,
            client: OrderClient {
                id: client.user.id,
                name: client.user.name.clone(),
            },
            items,
            payment: stored.payment.map(|moment| Payment { id, moment }),
        })
    }

    fn check_categories(&self, ids: &[CategoryId]) -> Result<(), RepositoryError> {
        if ids.iter().all(|id| self.categories.contains_key(id)) {
            Ok(())
        } else {
            Err(RepositoryError::IntegrityViolation(
                "unknown category".to_owned(),
            ))
        }
    }
}

/// All three stores over one in-memory data set.
#[derive(Debug, Default)]
pub struct InMemoryShop {
    tables: Mutex<Tables>,
}

impl InMemoryShop {
    /// An empty shop.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The development fixtures: three users, three categories, ten
    /// products, and three orders.
    #[must_use]
    pub fn seeded() -> Self {
        let mut t = Tables::default();

        for (id, name) in [(1, "Livros"), (2, "Eletrônicos"), (3, "Computadores")] {
            t.categories.insert(CategoryId::new(id), name.to_owned());
        }

        let users = [
            (1, "Maria Brown", MARIA, RoleSet::from([Role::Client])),
            (2, "Alex Green", ALEX, RoleSet::from([Role::Client, Role::Admin])),
            (3, "Ana", ANA, RoleSet::from([Role::Admin])),
        ];
        for (id, name, email, roles) in users {
            let Ok(email) = Email::parse(email) else {
                continue;
            };
            t.users.insert(
                UserId::new(id),
                StoredUser {
                    user: User {
                        id: UserId::new(id),
                        name: name.to_owned(),
                        email,
                        phone: None,
                        birth_date: NaiveDate::from_ymd_opt(2001, 7, 25),
                        roles,
                    },
                    password_hash: password_hash(),
                },
            );
        }

        let products = [
            (1, "The Lord of the Rings", "90.5", vec![1]),
            (2, "Smart TV", "2190.0", vec![2, 3]),
            (3, "Macbook Pro", "1250.0", vec![3]),
            (4, "PC Gamer", "1200.0", vec![3]),
            (5, "Rails for Dummies", "100.99", vec![1]),
            (6, "PC Gamer Ex", "1350.0", vec![3]),
            (7, "PC Gamer X", "1350.0", vec![3]),
            (8, "PC Gamer Alfa", "1850.0", vec![3]),
            (9, "PC Gamer Tera", "1950.0", vec![3]),
            (10, "PC Gamer Y", "1700.0", vec![3]),
        ];
        for (id, name, price, categories) in products {
            t.products.insert(
                ProductId::new(id),
                StoredProduct {
                    id: ProductId::new(id),
                    name: name.to_owned(),
                    description: "Lorem ipsum dolor sit amet, consectetur adipiscing elit."
                        .to_owned(),
                    price: dec(price),
                    img_url: Some(format!("https://img.example.com/{id}-big.jpg")),
                    categories: categories.into_iter().map(CategoryId::new).collect(),
                },
            );
        }

        t.orders.insert(
            OrderId::new(1),
            StoredOrder {
                moment: at(2022, 7, 25, 13, 0),
                status: OrderStatus::Paid,
                client: UserId::new(1),
                items: vec![
                    (ProductId::new(1), 2, dec("90.5")),
                    (ProductId::new(3), 1, dec("1250.0")),
                ],
                payment: Some(at(2022, 7, 25, 15, 0)),
            },
        );
        t.orders.insert(
            OrderId::new(2),
            StoredOrder {
                moment: at(2022, 7, 29, 15, 50),
                status: OrderStatus::Delivered,
                client: UserId::new(2),
                items: vec![(ProductId::new(3), 1, dec("1250.0"))],
                payment: Some(at(2022, 7, 30, 11, 0)),
            },
        );
        t.orders.insert(
            OrderId::new(3),
            StoredOrder {
                moment: at(2022, 8, 3, 14, 20),
                status: OrderStatus::WaitingPayment,
                client: UserId::new(1),
                items: vec![(ProductId::new(1), 1, dec("90.5"))],
                payment: None,
            },
        );

        Self {
            tables: Mutex::new(t),
        }
    }

    /// Number of stored orders.
    #[must_use]
    pub fn order_count(&self) -> usize {
        lock(&self.tables).orders.len()
    }

    /// Number of stored access tokens, expired ones included.
    #[must_use]
    pub fn token_count(&self) -> usize {
        lock(&self.tables).tokens.len()
    }

    /// Store a token for `email` directly, skipping the password check.
    ///
    /// Returns `None` if no fixture user has this email.
    #[must_use]
    pub fn issue_token(&self, email: &str, ttl: Duration) -> Option<String> {
        let mut t = lock(&self.tables);
        let user_id = t
            .users
            .values()
            .find(|u| u.user.email.as_str() == email)?
            .user
            .id;
        let token = generate_token();
        t.tokens
            .insert(hash_token(&token), (user_id, Utc::now() + ttl));
        Some(token)
    }

    /// Link `product` into `order`, so the product can no longer be deleted.
    pub fn add_order_item(&self, order: OrderId, product: ProductId, quantity: i32) {
        let mut t = lock(&self.tables);
        let price = t.products.get(&product).map(|p| p.price).unwrap_or_default();
        if let Some(stored) = t.orders.get_mut(&order) {
            stored.items.push((product, quantity, price));
        }
    }
}

#[async_trait]
impl ProductStore for InMemoryShop {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let t = lock(&self.tables);
        Ok(t.products.get(&id).map(|p| t.product(p)))
    }

    async fn search_products(
        &self,
        name: &str,
        page: &PageRequest,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        let t = lock(&self.tables);
        let needle = name.to_uppercase();
        let mut matches: Vec<&StoredProduct> = t
            .products
            .values()
            .filter(|p| p.name.to_uppercase().contains(&needle))
            .collect();

        matches.sort_by(|a, b| {
            let ordering = match page.sort.field {
                SortField::Id => a.id.cmp(&b.id),
                SortField::Name => a.name.cmp(&b.name),
                SortField::Price => a.price.cmp(&b.price),
            };
            let ordering = match page.sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            ordering.then(a.id.cmp(&b.id))
        });

        let total = matches.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let content = matches
            .into_iter()
            .skip(offset)
            .take(page.size as usize)
            .map(|p| t.product(p))
            .collect();
        Ok((content, total))
    }

    async fn product_exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        Ok(lock(&self.tables).products.contains_key(&id))
    }

    async fn insert_product(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let mut t = lock(&self.tables);
        t.check_categories(&draft.categories)?;

        let next = t.products.keys().max().map_or(1, |id| id.as_i64() + 1);
        let stored = StoredProduct {
            id: ProductId::new(next),
            name: draft.name.clone(),
            description: draft.description.clone(),
            price: draft.price,
            img_url: draft.img_url.clone(),
            categories: draft.categories.clone(),
        };
        let product = t.product(&stored);
        t.products.insert(stored.id, stored);
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut t = lock(&self.tables);
        if !t.products.contains_key(&id) {
            return Ok(None);
        }
        t.check_categories(&draft.categories)?;

        let stored = StoredProduct {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            price: draft.price,
            img_url: draft.img_url.clone(),
            categories: draft.categories.clone(),
        };
        let product = t.product(&stored);
        t.products.insert(id, stored);
        Ok(Some(product))
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let mut t = lock(&self.tables);
        let referenced = t
            .orders
            .values()
            .any(|o| o.items.iter().any(|(product, _, _)| *product == id));
        if referenced {
            return Err(RepositoryError::IntegrityViolation(
                "product is referenced by orders".to_owned(),
            ));
        }
        t.products
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let t = lock(&self.tables);
        let mut categories: Vec<Category> = t
            .categories
            .iter()
            .map(|(id, name)| Category {
                id: *id,
                name: name.clone(),
            })
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

#[async_trait]
impl OrderStore for InMemoryShop {
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let t = lock(&self.tables);
        t.orders.get(&id).map(|o| t.order(id, o)).transpose()
    }

    async fn save_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut t = lock(&self.tables);
        if order
            .items
            .iter()
            .any(|item| !t.products.contains_key(&item.product_id))
        {
            return Err(RepositoryError::IntegrityViolation(
                "unknown product".to_owned(),
            ));
        }

        let id = OrderId::new(t.orders.keys().max().map_or(1, |id| id.as_i64() + 1));
        let stored = StoredOrder {
            moment: order.moment,
            status: order.status,
            client: order.client_id,
            items: order
                .items
                .iter()
                .map(|item| (item.product_id, item.quantity, item.price))
                .collect(),
            payment: None,
        };
        let saved = t.order(id, &stored)?;
        t.orders.insert(id, stored);
        Ok(saved)
    }
}

#[async_trait]
impl UserStore for InMemoryShop {
    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.tables).users.get(&id).map(|u| u.user.clone()))
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        Ok(lock(&self.tables)
            .users
            .values()
            .find(|u| &u.user.email == email)
            .map(|u| UserCredentials {
                user: u.user.clone(),
                password_hash: u.password_hash.clone(),
            }))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut t = lock(&self.tables);
        if t.users.values().any(|u| u.user.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let id = UserId::new(t.users.keys().max().map_or(1, |id| id.as_i64() + 1));
        let created = User {
            id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            birth_date: user.birth_date,
            roles: user.roles.clone(),
        };
        t.users.insert(
            id,
            StoredUser {
                user: created.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(created)
    }

    async fn save_access_token(&self, token: &NewAccessToken) -> Result<(), RepositoryError> {
        let mut t = lock(&self.tables);
        if t.tokens.contains_key(&token.token_hash) {
            return Err(RepositoryError::Conflict("token already issued".to_owned()));
        }
        let now = Utc::now();
        t.tokens.retain(|_, (_, expires_at)| *expires_at > now);
        t.tokens
            .insert(token.token_hash.clone(), (token.user_id, token.expires_at));
        Ok(())
    }

    async fn find_user_by_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let t = lock(&self.tables);
        Ok(t.tokens
            .get(token_hash)
            .filter(|(_, expires_at)| *expires_at > now)
            .and_then(|(user_id, _)| t.users.get(user_id))
            .map(|u| u.user.clone()))
    }
}

/// A response with its body parsed as JSON (`Value::Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// The router wired to an [`InMemoryShop`].
pub struct TestApp {
    pub shop: Arc<InMemoryShop>,
    router: Router,
}

impl TestApp {
    /// App over the development fixtures.
    #[must_use]
    pub fn seeded() -> Self {
        Self::with_shop(InMemoryShop::seeded())
    }

    #[must_use]
    pub fn with_shop(shop: InMemoryShop) -> Self {
        let shop = Arc::new(shop);
        let stores = Stores::new(shop.clone(), shop.clone(), shop.clone());
        let config = ApiConfig::with_database_url(SecretString::from("postgres://unused/test"));
        let router = dscommerce_api::app(AppState::new(config, stores));
        Self { shop, router }
    }

    /// Valid one-hour bearer token for a fixture user.
    ///
    /// # Panics
    ///
    /// Panics if no fixture user has this email.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn token(&self, email: &str) -> String {
        self.shop
            .issue_token(email, Duration::hours(1))
            .expect("unknown fixture user")
    }

    /// Send one request through the full middleware stack.
    ///
    /// # Panics
    ///
    /// Panics if the router fails. Bodies that are not JSON come back as
    /// [`Value::String`].
    #[allow(clippy::unwrap_used)]
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request("GET", uri, token, None)).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: &Value) -> TestResponse {
        self.send(request("POST", uri, token, Some(body))).await
    }

    pub async fn put_json(&self, uri: &str, token: Option<&str>, body: &Value) -> TestResponse {
        self.send(request("PUT", uri, token, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request("DELETE", uri, token, None)).await
    }
}

/// Build a request with an optional bearer token and JSON body.
///
/// # Panics
///
/// Panics if `method` or `uri` is malformed.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
