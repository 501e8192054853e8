//! Request payloads

use crate::models::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One checkout line: `{product_id, quantity, unit_price}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemInput {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Decimal,
}

/// Body of `POST /api/orders`
///
/// `total` must equal the sum of `unit_price * quantity` over `items`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of `PATCH /api/orders/{id}/status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Body of `POST /api/auth/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Body of `POST /api/auth/register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}
