//! API route modules
//!
//! - [`health`] - liveness check
//! - [`auth`] - login / register / current identity
//! - [`products`] - read-only catalog
//! - [`orders`] - checkout, listings, status updates
//! - [`events`] - scoped realtime refresh cues (SSE)

pub mod auth;
pub mod events;
pub mod health;
pub mod orders;
pub mod products;
