//! Change-feed event types
//!
//! When order data changes, the storage layer broadcasts a [`ChangeEvent`]
//! and subscribed views receive a [`Signal`] telling them to re-fetch their
//! collection in full. Signals are cues, never authoritative payloads:
//! delivery is at-least-once and unordered across distinct mutations, so a
//! consumer may see redundant or out-of-order signals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Collections covered by the change feed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Orders,
    OrderLines,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Orders => write!(f, "orders"),
            Collection::OrderLines => write!(f, "order_lines"),
        }
    }
}

/// Kind of row mutation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Insert,
    Update,
    Delete,
}

/// A single row mutation, as published by the storage layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub action: ChangeAction,
    /// Id of the mutated row (the order id for line mutations too)
    pub id: String,
    /// Owning identity of the affected order; None for guest orders
    pub owner: Option<String>,
}

/// Refresh cue delivered to a subscribed view
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signal {
    pub collection: Collection,
}
