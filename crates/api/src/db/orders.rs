//! Order store over `shop.sales_order`, `shop.order_item`, and `shop.payment`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres};

use dscommerce_core::{OrderId, OrderStatus, ProductId, UserId};

use super::{OrderStore, RepositoryError};
use crate::models::{NewOrder, Order, OrderClient, OrderItem, Payment};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    moment: DateTime<Utc>,
    status: OrderStatus,
    client_id: i64,
    client_name: String,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    product_id: i64,
    name: String,
    img_url: Option<String>,
    quantity: i32,
    price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product_id: ProductId::new(row.product_id),
            name: row.name,
            img_url: row.img_url,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    order_id: i64,
    moment: DateTime<Utc>,
}

/// `PostgreSQL` implementation of [`OrderStore`].
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let Some(order) = sqlx::query_as::<Postgres, OrderRow>(
            r"
            SELECT o.id, o.moment, o.status, o.client_id, u.name AS client_name
            FROM shop.sales_order o
            JOIN shop.user u ON u.id = o.client_id
            WHERE o.id = $1
            ",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<Postgres, OrderItemRow>(
            r"
            SELECT i.product_id, p.name, p.img_url, i.quantity, i.price
            FROM shop.order_item i
            JOIN shop.product p ON p.id = i.product_id
            WHERE i.order_id = $1
            ORDER BY i.product_id
            ",
        )
        .bind(order.id)
        .fetch_all(&self.pool)
        .await?;

        if items.is_empty() {
            return Err(RepositoryError::DataCorruption(format!(
                "order {} has no items",
                order.id
            )));
        }

        let payment = sqlx::query_as::<Postgres, PaymentRow>(
            "SELECT order_id, moment FROM shop.payment WHERE order_id = $1",
        )
        .bind(order.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(Some(Order {
            id: OrderId::new(order.id),
            moment: order.moment,
            status: order.status,
            client: OrderClient {
                id: UserId::new(order.client_id),
                name: order.client_name,
            },
            items: items.into_iter().map(OrderItem::from).collect(),
            payment: payment.map(|p| Payment {
                id: OrderId::new(p.order_id),
                moment: p.moment,
            }),
        }))
    }

    async fn save_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query_as::<Postgres, OrderRow>(
            r"
            WITH inserted AS (
                INSERT INTO shop.sales_order (moment, status, client_id)
                VALUES ($1, $2, $3)
                RETURNING id, moment, status, client_id
            )
            SELECT i.id, i.moment, i.status, i.client_id, u.name AS client_name
            FROM inserted i
            JOIN shop.user u ON u.id = i.client_id
            ",
        )
        .bind(order.moment)
        .bind(order.status)
        .bind(order.client_id.as_i64())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "unknown client"))?;

        let mut items = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let row = sqlx::query_as::<Postgres, OrderItemRow>(
                r"
                WITH inserted AS (
                    INSERT INTO shop.order_item (order_id, product_id, quantity, price)
                    VALUES ($1, $2, $3, $4)
                    RETURNING product_id, quantity, price
                )
                SELECT i.product_id, p.name, p.img_url, i.quantity, i.price
                FROM inserted i
                JOIN shop.product p ON p.id = i.product_id
                ",
            )
            .bind(header.id)
            .bind(item.product_id.as_i64())
            .bind(item.quantity)
            .bind(item.price)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_sqlx(e, "unknown product"))?;

            items.push(OrderItem::from(row));
        }

        tx.commit().await?;

        items.sort_by_key(|item| item.product_id);

        tracing::debug!(order_id = header.id, items = items.len(), "order persisted");

        Ok(Order {
            id: OrderId::new(header.id),
            moment: header.moment,
            status: header.status,
            client: OrderClient {
                id: UserId::new(header.client_id),
                name: header.client_name,
            },
            items,
            payment: None,
        })
    }
}
