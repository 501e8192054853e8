//! Order row models

use shared::models::{Order, OrderLineDetail, OrderStatus};
use sqlx::FromRow;

use super::{parse_money, parse_quantity};
use crate::db::repository::{RepoError, RepoResult};

/// Row of the `orders` table
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: String,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub total: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl OrderRow {
    pub fn into_model(self) -> RepoResult<Order> {
        let status: OrderStatus = self
            .status
            .parse()
            .map_err(|e| RepoError::Database(format!("Corrupt status value: {e}")))?;
        Ok(Order {
            total: parse_money(&self.total, "total")?,
            id: self.id,
            user_id: self.user_id,
            user_name: self.user_name,
            status,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row of the order-line/product join used by the detail read shape
#[derive(Debug, Clone, FromRow)]
pub struct OrderLineDetailRow {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub product_name: Option<String>,
    pub image_url: Option<String>,
    pub quantity: i64,
    pub unit_price: String,
}

impl OrderLineDetailRow {
    pub fn into_model(self) -> RepoResult<OrderLineDetail> {
        Ok(OrderLineDetail {
            quantity: parse_quantity(self.quantity)?,
            unit_price: parse_money(&self.unit_price, "unit_price")?,
            id: self.id,
            product_id: self.product_id,
            product_name: self.product_name,
            image_url: self.image_url,
        })
    }
}
