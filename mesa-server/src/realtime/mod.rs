//! Realtime synchronization
//!
//! The storage layer publishes a [`ChangeEvent`](shared::sync::ChangeEvent)
//! on the [`ChangeFeed`] after every successful order mutation; the
//! [`RealtimeBridge`] turns that feed into scoped, payload-free refresh
//! cues for customer and operator views.

pub mod bridge;
pub mod feed;

pub use bridge::{RealtimeBridge, Scope, Subscription};
pub use feed::ChangeFeed;
