//! Order read and create workflows.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::instrument;

use dscommerce_core::{OrderId, OrderStatus, Principal, ProductId};

use super::ServiceError;
use super::auth::validate_self_or_admin;
use crate::db::{OrderStore, ProductStore, RepositoryError, Stores};
use crate::dto::{NewOrderRequest, OrderDto};
use crate::models::{NewOrder, NewOrderItem};

/// A product was deleted between the lookup and the order insert.
fn product_gone(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::IntegrityViolation(_) => {
            ServiceError::NotFound("product not found".to_owned())
        }
        other => ServiceError::Repository(other),
    }
}

pub struct OrderService<'a> {
    orders: &'a dyn OrderStore,
    products: &'a dyn ProductStore,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub fn new(stores: &'a Stores) -> Self {
        Self {
            orders: stores.orders.as_ref(),
            products: stores.products.as_ref(),
        }
    }

    /// Fetch an order the principal is allowed to see.
    ///
    /// Existence is checked first: a missing order is `NotFound` for every
    /// caller, an existing order owned by someone else is `Forbidden`.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if no order has this id.
    /// Returns `ServiceError::Auth(AuthError::Forbidden)` if the principal is
    /// neither the order's client nor an admin.
    #[instrument(skip(self, principal), fields(principal = %principal.id))]
    pub async fn find_by_id(
        &self,
        principal: &Principal,
        id: OrderId,
    ) -> Result<OrderDto, ServiceError> {
        let order = self
            .orders
            .find_order(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {id} not found")))?;

        validate_self_or_admin(principal, order.client.id)?;

        Ok(OrderDto::from(&order))
    }

    /// Place an order for the principal.
    ///
    /// The order is stamped with the current instant and starts as
    /// `WAITING_PAYMENT`. Each item takes the product's current price.
    /// Repeated product ids are merged into one line with the summed quantity.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if any referenced product is missing;
    /// nothing is persisted in that case.
    #[instrument(skip(self, principal, request), fields(principal = %principal.id, items = request.items.len()))]
    pub async fn insert(
        &self,
        principal: &Principal,
        request: &NewOrderRequest,
    ) -> Result<OrderDto, ServiceError> {
        let mut quantities: BTreeMap<ProductId, i32> = BTreeMap::new();
        for item in &request.items {
            let quantity = quantities.entry(item.product_id).or_default();
            *quantity = quantity.saturating_add(item.quantity);
        }

        let mut items = Vec::with_capacity(quantities.len());
        for (product_id, quantity) in quantities {
            let product = self
                .products
                .find_product(product_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("product {product_id} not found")))?;

            items.push(NewOrderItem {
                product_id,
                quantity,
                price: product.price,
            });
        }

        let order = self
            .orders
            .save_order(&NewOrder {
                moment: Utc::now(),
                status: OrderStatus::WaitingPayment,
                client_id: principal.id,
                items,
            })
            .await
            .map_err(product_gone)?;

        tracing::info!(order_id = %order.id, total = %order.total(), "order created");

        Ok(OrderDto::from(&order))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use dscommerce_core::{Role, RoleSet, UserId};

    use super::*;
    use crate::db::{MockOrderStore, MockProductStore, MockUserStore};
    use crate::dto::OrderItemRequest;
    use crate::models::{Order, OrderClient, OrderItem, Product};
    use crate::services::AuthError;

    const EXISTING_ORDER: i64 = 1;
    const MISSING_ORDER: i64 = 2;
    const EXISTING_PRODUCT: i64 = 1;
    const MISSING_PRODUCT: i64 = 2;

    fn admin() -> Principal {
        Principal::new(UserId::new(1), RoleSet::from([Role::Admin]))
    }

    fn client() -> Principal {
        Principal::new(UserId::new(2), RoleSet::from([Role::Client]))
    }

    fn other_client() -> Principal {
        Principal::new(UserId::new(3), RoleSet::from([Role::Client]))
    }

    fn product() -> Product {
        Product {
            id: ProductId::new(EXISTING_PRODUCT),
            name: "Console PlayStation 5".to_owned(),
            description: "Lorem ipsum, dolor sit amet consectetur adipisicing elit.".to_owned(),
            price: Decimal::new(399_000, 2),
            img_url: Some("https://example.com/ps5.jpg".to_owned()),
            categories: vec![],
        }
    }

    fn order_of(client_id: UserId, items: Vec<NewOrderItem>) -> Order {
        Order {
            id: OrderId::new(EXISTING_ORDER),
            moment: Utc.with_ymd_and_hms(2022, 7, 25, 13, 0, 0).unwrap(),
            status: OrderStatus::WaitingPayment,
            client: OrderClient {
                id: client_id,
                name: "Bob".to_owned(),
            },
            items: items
                .into_iter()
                .map(|item| OrderItem {
                    product_id: item.product_id,
                    name: product().name,
                    img_url: None,
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            payment: None,
        }
    }

    fn existing_order() -> Order {
        order_of(
            UserId::new(2),
            vec![NewOrderItem {
                product_id: ProductId::new(EXISTING_PRODUCT),
                quantity: 2,
                price: Decimal::new(1000, 2),
            }],
        )
    }

    fn stores(orders: MockOrderStore, products: MockProductStore) -> Stores {
        Stores::new(
            Arc::new(products),
            Arc::new(orders),
            Arc::new(MockUserStore::new()),
        )
    }

    fn order_store() -> MockOrderStore {
        let mut orders = MockOrderStore::new();
        orders.expect_find_order().returning(|id| {
            Ok((id == OrderId::new(EXISTING_ORDER)).then(existing_order))
        });
        orders
            .expect_save_order()
            .returning(|new| Ok(order_of(new.client_id, new.items.clone())));
        orders
    }

    fn product_store() -> MockProductStore {
        let mut products = MockProductStore::new();
        products.expect_find_product().returning(|id| {
            Ok((id == ProductId::new(EXISTING_PRODUCT)).then(product))
        });
        products
    }

    fn request(items: &[(i64, i32)]) -> NewOrderRequest {
        NewOrderRequest {
            items: items
                .iter()
                .map(|&(product_id, quantity)| OrderItemRequest {
                    product_id: ProductId::new(product_id),
                    quantity,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id_returns_order_when_admin_logged() {
        let stores = stores(order_store(), product_store());
        let service = OrderService::new(&stores);

        let result = service
            .find_by_id(&admin(), OrderId::new(EXISTING_ORDER))
            .await
            .unwrap();

        assert_eq!(result.id, OrderId::new(EXISTING_ORDER));
    }

    #[tokio::test]
    async fn test_find_by_id_returns_order_when_self_client_logged() {
        let stores = stores(order_store(), product_store());
        let service = OrderService::new(&stores);

        let result = service
            .find_by_id(&client(), OrderId::new(EXISTING_ORDER))
            .await
            .unwrap();

        assert_eq!(result.id, OrderId::new(EXISTING_ORDER));
        assert_eq!(result.total, Decimal::new(2000, 2));
    }

    #[tokio::test]
    async fn test_find_by_id_is_forbidden_for_other_client() {
        let stores = stores(order_store(), product_store());
        let service = OrderService::new(&stores);

        let result = service
            .find_by_id(&other_client(), OrderId::new(EXISTING_ORDER))
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Auth(AuthError::Forbidden(_)))
        ));
    }

    #[tokio::test]
    async fn test_find_by_id_is_not_found_before_authorization() {
        let stores = stores(order_store(), product_store());
        let service = OrderService::new(&stores);

        for principal in [admin(), other_client()] {
            let result = service
                .find_by_id(&principal, OrderId::new(MISSING_ORDER))
                .await;
            assert!(matches!(result, Err(ServiceError::NotFound(_))));
        }
    }

    #[tokio::test]
    async fn test_insert_returns_order_when_admin_logged() {
        let stores = stores(order_store(), product_store());
        let service = OrderService::new(&stores);

        let result = service
            .insert(&admin(), &request(&[(EXISTING_PRODUCT, 2)]))
            .await
            .unwrap();

        assert_eq!(result.client.id, admin().id);
    }

    #[tokio::test]
    async fn test_insert_snapshots_price_and_stamps_order_for_client() {
        let mut orders = MockOrderStore::new();
        orders
            .expect_save_order()
            .withf(|new| {
                new.client_id == UserId::new(2)
                    && new.status == OrderStatus::WaitingPayment
                    && new.items.len() == 1
                    && new.items[0].price == Decimal::new(399_000, 2)
                    && new.items[0].quantity == 2
            })
            .times(1)
            .returning(|new| Ok(order_of(new.client_id, new.items.clone())));

        let stores = stores(orders, product_store());
        let service = OrderService::new(&stores);

        let result = service
            .insert(&client(), &request(&[(EXISTING_PRODUCT, 2)]))
            .await
            .unwrap();

        assert_eq!(result.status, OrderStatus::WaitingPayment);
        assert_eq!(result.total, Decimal::new(798_000, 2));
    }

    #[tokio::test]
    async fn test_insert_merges_repeated_products() {
        let mut orders = MockOrderStore::new();
        orders
            .expect_save_order()
            .withf(|new| new.items.len() == 1 && new.items[0].quantity == 5)
            .returning(|new| Ok(order_of(new.client_id, new.items.clone())));

        let stores = stores(orders, product_store());
        let service = OrderService::new(&stores);

        let result = service
            .insert(&client(), &request(&[(EXISTING_PRODUCT, 2), (EXISTING_PRODUCT, 3)]))
            .await
            .unwrap();

        assert_eq!(result.items.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_fails_when_product_does_not_exist() {
        let mut orders = MockOrderStore::new();
        orders.expect_save_order().never();

        let stores = stores(orders, product_store());
        let service = OrderService::new(&stores);

        let result = service
            .insert(
                &client(),
                &request(&[(EXISTING_PRODUCT, 2), (MISSING_PRODUCT, 2)]),
            )
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_insert_is_not_found_when_product_is_deleted_concurrently() {
        let mut orders = MockOrderStore::new();
        orders.expect_save_order().times(1).returning(|_| {
            Err(RepositoryError::IntegrityViolation("unknown product".to_owned()))
        });

        let stores = stores(orders, product_store());
        let service = OrderService::new(&stores);

        let result = service
            .insert(&client(), &request(&[(EXISTING_PRODUCT, 1)]))
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_insert_passes_through_other_store_failures() {
        let mut orders = MockOrderStore::new();
        orders
            .expect_save_order()
            .returning(|_| Err(RepositoryError::Conflict("duplicate item".to_owned())));

        let stores = stores(orders, product_store());
        let service = OrderService::new(&stores);

        let result = service
            .insert(&client(), &request(&[(EXISTING_PRODUCT, 1)]))
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Repository(RepositoryError::Conflict(_)))
        ));
    }
}
