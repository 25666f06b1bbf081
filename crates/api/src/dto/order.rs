//! Order projections and the order creation request.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use dscommerce_core::{OrderId, OrderStatus, ProductId, UserId};

use crate::models::{Order, OrderClient, OrderItem, Payment};

/// An order as returned by `GET /orders/{id}` and `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: OrderId,
    pub moment: DateTime<Utc>,
    pub status: OrderStatus,
    pub client: ClientDto,
    pub payment: Option<PaymentDto>,
    pub items: Vec<OrderItemDto>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

impl From<&Order> for OrderDto {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            moment: order.moment,
            status: order.status,
            client: ClientDto::from(&order.client),
            payment: order.payment.as_ref().map(PaymentDto::from),
            items: order.items.iter().map(OrderItemDto::from).collect(),
            total: order.total(),
        }
    }
}

/// The order's client. Only id and name are exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientDto {
    pub id: UserId,
    pub name: String,
}

impl From<&OrderClient> for ClientDto {
    fn from(client: &OrderClient) -> Self {
        Self {
            id: client.id,
            name: client.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentDto {
    pub id: OrderId,
    pub moment: DateTime<Utc>,
}

impl From<&Payment> for PaymentDto {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id,
            moment: payment.moment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDto {
    pub product_id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: i32,
    pub img_url: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub sub_total: Decimal,
}

impl From<&OrderItem> for OrderItemDto {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            img_url: item.img_url.clone(),
            sub_total: item.sub_total(),
        }
    }
}

/// Body of `POST /orders`.
///
/// Only the product ids and quantities are read. Any other fields a client
/// echoes back from an [`OrderDto`] (id, moment, status, prices) are ignored;
/// the server decides them.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    #[validate(length(min = 1, message = "order must have at least one item"))]
    #[validate(nested)]
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: i32,
}
