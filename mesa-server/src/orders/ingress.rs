//! Checkout ingress
//!
//! Turns a validated checkout request into a persisted order header plus
//! line items. The backing store is non-transactional across rows, so the
//! write is an emulated two-phase transaction:
//!
//! 1. insert the header with status `new`
//! 2. insert all lines referencing the new header id
//! 3. on a line failure, compensate by deleting the header, then report
//!    the line failure
//!
//! A success result guarantees header and lines are persisted together; a
//! line failure guarantees no header survives unless the compensation
//! itself failed, which is surfaced as the distinct
//! [`CheckoutError::Compensation`]. Validation and authentication are
//! checked before any write and produce no side effects. Phase 2 never
//! starts before phase 1's id is known, and a failed phase 2 is never
//! retried.

use rust_decimal::Decimal;
use shared::models::Order;
use shared::request::CreateOrderRequest;
use thiserror::Error;

use super::store::{NewOrder, NewOrderLine, OrderStore};
use crate::auth::CurrentUser;
use crate::db::repository::RepoError;
use crate::utils::{AppError, WritePhase};

/// Checkout failure
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("{0}")]
    Validation(String),

    #[error("Header insert failed: {0}")]
    Header(RepoError),

    #[error("Line insert failed: {0}")]
    Lines(RepoError),

    /// The compensation delete failed after a line failure; an orphan
    /// header may remain until the reconciliation sweep removes it.
    #[error("Compensation failed for order {order_id}: {source}")]
    Compensation {
        order_id: String,
        source: RepoError,
    },
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::AuthRequired => AppError::Unauthorized,
            CheckoutError::Validation(msg) => AppError::Validation(msg),
            CheckoutError::Header(e) => AppError::PersistFailed {
                phase: WritePhase::Header,
                message: e.to_string(),
            },
            CheckoutError::Lines(e) => AppError::PersistFailed {
                phase: WritePhase::Lines,
                message: e.to_string(),
            },
            CheckoutError::Compensation { order_id, source } => AppError::CompensationFailed {
                order_id,
                message: source.to_string(),
            },
        }
    }
}

/// Checkout entry point over an injected [`OrderStore`]
#[derive(Clone)]
pub struct OrderIngress<S> {
    store: S,
}

impl<S: OrderStore> OrderIngress<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validate and persist a checkout request
    pub async fn submit(
        &self,
        identity: Option<&CurrentUser>,
        request: CreateOrderRequest,
    ) -> Result<Order, CheckoutError> {
        let identity = identity.ok_or(CheckoutError::AuthRequired)?;
        let lines = validate(&request)?;

        // Phase 1: header
        let header = NewOrder::create(
            Some(identity.id.clone()),
            identity.name.clone(),
            request.total,
            request.notes.clone(),
        );
        let order = self
            .store
            .insert_header(header)
            .await
            .map_err(CheckoutError::Header)?;

        // Phase 2: lines, with compensation on failure
        if let Err(line_err) = self.store.insert_lines(&order, lines).await {
            tracing::warn!(
                order_id = %order.id,
                error = %line_err,
                "Line insert failed, compensating"
            );
            return match self.store.delete_header(&order.id).await {
                Ok(_) => Err(CheckoutError::Lines(line_err)),
                Err(comp_err) => Err(CheckoutError::Compensation {
                    order_id: order.id.clone(),
                    source: comp_err,
                }),
            };
        }

        tracing::info!(order_id = %order.id, total = %order.total, "Order created");
        Ok(order)
    }
}

/// Check the request and convert its items into line payloads
fn validate(request: &CreateOrderRequest) -> Result<Vec<NewOrderLine>, CheckoutError> {
    if request.items.is_empty() {
        return Err(CheckoutError::Validation(
            "Order must contain at least one item".to_string(),
        ));
    }

    let mut lines = Vec::with_capacity(request.items.len());
    let mut computed = Decimal::ZERO;
    for item in &request.items {
        if item.quantity <= 0 {
            return Err(CheckoutError::Validation(format!(
                "Item quantity must be positive, got {}",
                item.quantity
            )));
        }
        if item.unit_price <= Decimal::ZERO {
            return Err(CheckoutError::Validation(format!(
                "Item price must be positive, got {}",
                item.unit_price
            )));
        }
        let quantity = u32::try_from(item.quantity).map_err(|_| {
            CheckoutError::Validation(format!("Item quantity out of range: {}", item.quantity))
        })?;
        computed += item.unit_price * Decimal::from(quantity);
        lines.push(NewOrderLine {
            product_id: item.product_id.clone(),
            quantity,
            unit_price: item.unit_price,
        });
    }

    if request.total <= Decimal::ZERO {
        return Err(CheckoutError::Validation("Invalid order total".to_string()));
    }
    if request.total != computed {
        return Err(CheckoutError::Validation(format!(
            "Order total {} does not match its items ({computed})",
            request.total
        )));
    }

    Ok(lines)
}
