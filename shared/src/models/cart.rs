//! Cart Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product data snapshotted into the cart when a line is added
///
/// Price, name and image are taken from this input, not re-fetched later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartProduct {
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
}

/// One product-id-keyed entry of a client's in-progress order
///
/// A cart holds at most one line per product id; quantity is always >= 1
/// (removal, not zero, represents absence).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub image_url: Option<String>,
}

impl CartLine {
    pub fn new(product: CartProduct, quantity: u32) -> Self {
        Self {
            product_id: product.product_id,
            name: product.name,
            price: product.price,
            quantity,
            image_url: product.image_url,
        }
    }

    /// price * quantity
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}
