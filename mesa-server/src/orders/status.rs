//! Order status engine
//!
//! Applies the closed transition graph on [`OrderStatus`]: a transition is
//! either fully applied (status + updated timestamp in one guarded update)
//! or rejected without touching the order. Only an elevated-role actor may
//! transition; the authorization check runs before any read or write.

use shared::models::{Order, OrderStatus};
use thiserror::Error;

use super::store::OrderStore;
use crate::auth::CurrentUser;
use crate::db::repository::RepoError;
use crate::utils::AppError;

/// Status transition failure
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Operator role required")]
    Forbidden,

    #[error("Order {0} not found")]
    NotFound(String),

    #[error("Cannot move order from {from} to {to}")]
    Invalid { from: OrderStatus, to: OrderStatus },

    /// A concurrent writer moved the order first
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(RepoError),
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Forbidden => AppError::forbidden("Operator role required"),
            TransitionError::NotFound(id) => AppError::not_found(format!("Order {id}")),
            TransitionError::Invalid { from, to } => AppError::InvalidTransition { from, to },
            TransitionError::Conflict(msg) => AppError::Conflict(msg),
            TransitionError::Store(e) => e.into(),
        }
    }
}

/// Status transitions over an injected [`OrderStore`]
#[derive(Clone)]
pub struct StatusEngine<S> {
    store: S,
}

impl<S: OrderStore> StatusEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Move one order to `to`, if the actor is elevated and the transition
    /// is legal from the order's current status.
    pub async fn transition(
        &self,
        actor: &CurrentUser,
        order_id: &str,
        to: OrderStatus,
    ) -> Result<Order, TransitionError> {
        if !actor.is_elevated() {
            return Err(TransitionError::Forbidden);
        }

        let current = self
            .store
            .find_header(order_id)
            .await
            .map_err(TransitionError::Store)?
            .ok_or_else(|| TransitionError::NotFound(order_id.to_string()))?;

        let from = current.status;
        if !from.can_transition_to(to) {
            return Err(TransitionError::Invalid { from, to });
        }

        let updated = self
            .store
            .update_status(order_id, from, to)
            .await
            .map_err(|e| match e {
                RepoError::Conflict(msg) => TransitionError::Conflict(msg),
                RepoError::NotFound(_) => TransitionError::NotFound(order_id.to_string()),
                other => TransitionError::Store(other),
            })?;

        tracing::info!(order_id = %order_id, from = %from, to = %to, "Order status updated");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::store::tests::{header, memory_store};
    use crate::orders::store::SqliteOrderStore;
    use rust_decimal::Decimal;
    use shared::models::Role;

    fn operator() -> CurrentUser {
        CurrentUser {
            id: "op-1".to_string(),
            name: Some("Op".to_string()),
            role: Role::Admin,
        }
    }

    fn customer() -> CurrentUser {
        CurrentUser {
            id: "user-1".to_string(),
            name: None,
            role: Role::Customer,
        }
    }

    async fn seed(store: &SqliteOrderStore, status: OrderStatus) -> Order {
        let mut order = header(Some("user-1"), Decimal::new(500, 2));
        order.status = status;
        store.insert_header(order).await.unwrap()
    }

    #[tokio::test]
    async fn full_lifecycle_succeeds_then_terminal_rejects() {
        let store = memory_store().await;
        let engine = StatusEngine::new(store.clone());
        let op = operator();
        let order = seed(&store, OrderStatus::New).await;

        for next in [
            OrderStatus::Accepted,
            OrderStatus::Preparing,
            OrderStatus::Completed,
        ] {
            let updated = engine.transition(&op, &order.id, next).await.unwrap();
            assert_eq!(updated.status, next);
        }

        // Any further transition from the terminal state is rejected
        for next in OrderStatus::ALL {
            let err = engine.transition(&op, &order.id, next).await.unwrap_err();
            assert!(matches!(err, TransitionError::Invalid { .. }));
        }
        let current = store.find_header(&order.id).await.unwrap().unwrap();
        assert_eq!(current.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn completed_to_preparing_is_rejected_unchanged() {
        let store = memory_store().await;
        let engine = StatusEngine::new(store.clone());
        let order = seed(&store, OrderStatus::Completed).await;

        let err = engine
            .transition(&operator(), &order.id, OrderStatus::Preparing)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransitionError::Invalid {
                from: OrderStatus::Completed,
                to: OrderStatus::Preparing,
            }
        ));
        let current = store.find_header(&order.id).await.unwrap().unwrap();
        assert_eq!(current.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn every_pair_outside_the_table_is_rejected() {
        let store = memory_store().await;
        let engine = StatusEngine::new(store.clone());
        let op = operator();

        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                if from.can_transition_to(to) {
                    continue;
                }
                let order = seed(&store, from).await;
                let err = engine.transition(&op, &order.id, to).await.unwrap_err();
                assert!(
                    matches!(err, TransitionError::Invalid { .. }),
                    "{from} -> {to} must be invalid"
                );
                let current = store.find_header(&order.id).await.unwrap().unwrap();
                assert_eq!(current.status, from, "{from} -> {to} must not mutate");
            }
        }
    }

    #[tokio::test]
    async fn customers_cannot_transition() {
        let store = memory_store().await;
        let engine = StatusEngine::new(store.clone());
        let order = seed(&store, OrderStatus::New).await;

        let err = engine
            .transition(&customer(), &order.id, OrderStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, TransitionError::Forbidden));
        let current = store.find_header(&order.id).await.unwrap().unwrap();
        assert_eq!(current.status, OrderStatus::New);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let store = memory_store().await;
        let engine = StatusEngine::new(store);

        let err = engine
            .transition(&operator(), "missing", OrderStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, TransitionError::NotFound(_)));
    }

    #[tokio::test]
    async fn losing_a_race_is_a_conflict() {
        let store = memory_store().await;
        let engine = StatusEngine::new(store.clone());
        let order = seed(&store, OrderStatus::New).await;

        // Another operator wins between our legality check and the write:
        // simulate by moving the order underneath the engine's store call.
        store
            .update_status(&order.id, OrderStatus::New, OrderStatus::Cancelled)
            .await
            .unwrap();

        // The engine now sees `cancelled` and rejects; the store-level CAS
        // is exercised in the store tests.
        let err = engine
            .transition(&operator(), &order.id, OrderStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, TransitionError::Invalid { .. }));
    }
}
