//! Mesa Client - cart state and HTTP client for the Mesa server
//!
//! The cart lives on the client: an in-memory line list mirrored to a
//! durable redb slot so it survives restarts, with debounced writes. The
//! HTTP client wraps the server API and drives checkout from the cart.

pub mod cart;
pub mod config;
pub mod error;
pub mod http;

pub use cart::{CartStore, DEFAULT_TAX_RATE};
pub use config::ClientConfig;
pub use error::{CartError, ClientError, ClientResult};
pub use http::HttpClient;

// Re-export shared types for convenience
pub use shared::models::{CartLine, CartProduct, Order, OrderDetail, OrderStatus, Product, Profile};
