//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use dscommerce_core::{OrderId, OrderStatus, ProductId, UserId};

/// A persisted order with its items and optional payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub moment: DateTime<Utc>,
    pub status: OrderStatus,
    pub client: OrderClient,
    /// Ordered by product id. Never empty for a persisted order.
    pub items: Vec<OrderItem>,
    pub payment: Option<Payment>,
}

impl Order {
    /// Sum of `price * quantity` over all items.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(OrderItem::sub_total).sum()
    }
}

/// The client an order belongs to, as much of the user as an order needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClient {
    pub id: UserId,
    pub name: String,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    pub product_id: ProductId,
    /// Product name, joined at read time.
    pub name: String,
    pub img_url: Option<String>,
    pub quantity: i32,
    /// Unit price captured when the order was placed.
    pub price: Decimal,
}

impl OrderItem {
    #[must_use]
    pub fn sub_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Payment record of a paid order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payment {
    /// Payments share their order's id.
    pub id: OrderId,
    pub moment: DateTime<Utc>,
}

/// An order ready to be persisted. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub moment: DateTime<Utc>,
    pub status: OrderStatus,
    pub client_id: UserId,
    pub items: Vec<NewOrderItem>,
}

/// A line of a [`NewOrder`] with its price snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub price: Decimal,
}
