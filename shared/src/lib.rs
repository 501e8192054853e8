//! Shared types for the Mesa ordering system
//!
//! Common types used by the server and clients: domain models, request and
//! response payloads, change-feed events, and small utilities.

pub mod models;
pub mod request;
pub mod response;
pub mod sync;
pub mod util;

// Re-exports
pub use models::{
    CartLine, CartProduct, Order, OrderDetail, OrderLine, OrderLineDetail, OrderStatus, Product,
    Profile, Role,
};
pub use sync::{ChangeAction, ChangeEvent, Collection, Signal};
