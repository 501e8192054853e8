//! Product row model

use shared::models::Product;
use sqlx::FromRow;

use super::parse_money;
use crate::db::repository::RepoResult;

/// Row of the `products` table
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub image_url: Option<String>,
    pub category: String,
    pub available: bool,
    pub created_at: i64,
}

impl ProductRow {
    pub fn into_model(self) -> RepoResult<Product> {
        Ok(Product {
            price: parse_money(&self.price, "price")?,
            id: self.id,
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            category: self.category,
            available: self.available,
            created_at: self.created_at,
        })
    }
}
