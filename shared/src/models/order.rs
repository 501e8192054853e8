//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order lifecycle status
///
/// The transition graph is closed: an order only ever moves forward through
/// [`OrderStatus::can_transition_to`], never backward and never skipping to a
/// state that is not reachable from its current one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    New,
    Accepted,
    Preparing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// All states, in lifecycle order
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::New,
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match self {
            New => matches!(next, Accepted | Cancelled),
            Accepted => matches!(next, Preparing | Cancelled),
            Preparing => matches!(next, Completed | Cancelled),
            Completed | Cancelled => false,
        }
    }

    /// Terminal states accept no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(OrderStatus::New),
            "accepted" => Ok(OrderStatus::Accepted),
            "preparing" => Ok(OrderStatus::Preparing),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Order header
///
/// `total` equals the sum of `unit_price * quantity` over the order's lines
/// as computed at creation time; it is never recomputed from current product
/// prices. After creation only `status` and `updated_at` change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    /// Owning identity; None for guest orders
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub notes: Option<String>,
    /// UTC milliseconds
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line item (immutable once persisted)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: u32,
    /// Price snapshot at order time, independent of later product changes
    pub unit_price: Decimal,
    pub created_at: i64,
}

/// Line item enriched with product display data (denormalized read shape)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineDetail {
    pub id: String,
    pub product_id: String,
    pub product_name: Option<String>,
    pub image_url: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Order joined with its lines, the shape both views fetch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLineDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_is_exact() {
        use OrderStatus::*;
        let legal = [
            (New, Accepted),
            (New, Cancelled),
            (Accepted, Preparing),
            (Accepted, Cancelled),
            (Preparing, Completed),
            (Preparing, Cancelled),
        ];
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from} -> {to} should be {expected}"
                );
            }
        }
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for to in OrderStatus::ALL {
            assert!(!OrderStatus::Completed.can_transition_to(to));
            assert!(!OrderStatus::Cancelled.can_transition_to(to));
        }
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::New.is_terminal());
    }

    #[test]
    fn status_serde_round_trip() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
            let back: OrderStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("done".parse::<OrderStatus>().is_err());
    }
}
