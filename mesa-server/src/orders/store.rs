//! Order storage seam
//!
//! [`OrderStore`] is the abstract storage collaborator the checkout ingress
//! and status engine are written against: row-level operations on order
//! headers and lines, plus subscription to the change feed. The operations
//! are deliberately non-transactional across rows; the two-phase checkout
//! write and its compensation live above this seam.
//!
//! [`SqliteOrderStore`] is the production implementation. Every successful
//! mutation publishes a [`ChangeEvent`] so that no write path can forget to
//! notify the realtime bridge.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{Order, OrderDetail, OrderStatus};
use shared::sync::{ChangeAction, ChangeEvent, Collection};
use shared::util::now_millis;
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::db::models::{OrderLineDetailRow, OrderRow};
use crate::db::repository::{RepoError, RepoResult};
use crate::realtime::ChangeFeed;

const ORDER_COLUMNS: &str = "id, user_id, user_name, total, status, notes, created_at, updated_at";

/// New order header payload
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: String,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: i64,
}

impl NewOrder {
    /// Fresh header with a generated id and the initial `new` status
    pub fn create(
        user_id: Option<String>,
        user_name: Option<String>,
        total: Decimal,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            user_name,
            total,
            status: OrderStatus::New,
            notes,
            created_at: now_millis(),
        }
    }
}

/// New order line payload (id generated at insert time)
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Storage collaborator for order data
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Phase 1 of checkout: persist the header row
    async fn insert_header(&self, order: NewOrder) -> RepoResult<Order>;

    /// Phase 2 of checkout: persist all line rows for `order`
    async fn insert_lines(&self, order: &Order, lines: Vec<NewOrderLine>) -> RepoResult<()>;

    /// Compensation: remove a header (cascades to any partially written
    /// lines). Returns false when the header no longer exists.
    async fn delete_header(&self, order_id: &str) -> RepoResult<bool>;

    async fn find_header(&self, order_id: &str) -> RepoResult<Option<Order>>;

    /// Write `to` over an order currently in `from`, bumping `updated_at`.
    /// The update is guarded by the expected prior status: if a concurrent
    /// writer got there first the call fails with a conflict and changes
    /// nothing.
    async fn update_status(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> RepoResult<Order>;

    async fn find_detail(&self, order_id: &str) -> RepoResult<Option<OrderDetail>>;

    /// Orders owned by `user_id`, newest first, joined with their lines
    async fn list_for_owner(&self, user_id: &str) -> RepoResult<Vec<OrderDetail>>;

    /// Every order, newest first, joined with its lines (operator view)
    async fn list_all(&self) -> RepoResult<Vec<OrderDetail>>;

    /// Headers with zero lines created before `cutoff_millis`, the residue
    /// of a failed compensation
    async fn find_orphans(&self, cutoff_millis: i64) -> RepoResult<Vec<String>>;

    /// Subscribe to the raw change feed
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

/// SQLite-backed order store
#[derive(Clone)]
pub struct SqliteOrderStore {
    pool: SqlitePool,
    changes: ChangeFeed,
}

impl SqliteOrderStore {
    pub fn new(pool: SqlitePool, changes: ChangeFeed) -> Self {
        Self { pool, changes }
    }

    pub fn changes(&self) -> &ChangeFeed {
        &self.changes
    }

    fn publish(&self, collection: Collection, action: ChangeAction, order: &Order) {
        self.changes.publish(ChangeEvent {
            collection,
            action,
            id: order.id.clone(),
            owner: order.user_id.clone(),
        });
    }

    async fn fetch_header(&self, order_id: &str) -> RepoResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(OrderRow::into_model).transpose()
    }

    async fn assemble_details(&self, headers: Vec<OrderRow>) -> RepoResult<Vec<OrderDetail>> {
        let mut orders = Vec::with_capacity(headers.len());
        for row in headers {
            orders.push(row.into_model()?);
        }
        if orders.is_empty() {
            return Ok(vec![]);
        }

        let placeholders = vec!["?"; orders.len()].join(", ");
        let sql = format!(
            "SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name, \
                    p.image_url, oi.quantity, oi.unit_price \
             FROM order_items oi \
             LEFT JOIN products p ON p.id = oi.product_id \
             WHERE oi.order_id IN ({placeholders}) \
             ORDER BY oi.created_at, oi.id"
        );
        let mut query = sqlx::query_as::<_, OrderLineDetailRow>(&sql);
        for order in &orders {
            query = query.bind(&order.id);
        }
        let line_rows = query.fetch_all(&self.pool).await?;

        let mut by_order: HashMap<String, Vec<_>> = HashMap::new();
        for row in line_rows {
            let order_id = row.order_id.clone();
            by_order.entry(order_id).or_default().push(row.into_model()?);
        }

        Ok(orders
            .into_iter()
            .map(|order| {
                let items = by_order.remove(&order.id).unwrap_or_default();
                OrderDetail { order, items }
            })
            .collect())
    }
}

#[async_trait]
impl OrderStore for SqliteOrderStore {
    async fn insert_header(&self, order: NewOrder) -> RepoResult<Order> {
        sqlx::query(
            "INSERT INTO orders (id, user_id, user_name, total, status, notes, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(&order.user_name)
        .bind(order.total.to_string())
        .bind(order.status.as_str())
        .bind(&order.notes)
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        let created = Order {
            id: order.id,
            user_id: order.user_id,
            user_name: order.user_name,
            total: order.total,
            status: order.status,
            notes: order.notes,
            created_at: order.created_at,
            updated_at: order.created_at,
        };
        self.publish(Collection::Orders, ChangeAction::Insert, &created);
        Ok(created)
    }

    async fn insert_lines(&self, order: &Order, lines: Vec<NewOrderLine>) -> RepoResult<()> {
        let created_at = now_millis();
        // A mid-loop failure may leave some lines behind; the compensation
        // delete cascades over them.
        for line in &lines {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order.id)
            .bind(&line.product_id)
            .bind(line.quantity as i64)
            .bind(line.unit_price.to_string())
            .bind(created_at)
            .execute(&self.pool)
            .await?;
        }

        self.publish(Collection::OrderLines, ChangeAction::Insert, order);
        Ok(())
    }

    async fn delete_header(&self, order_id: &str) -> RepoResult<bool> {
        let Some(order) = self.fetch_header(order_id).await? else {
            return Ok(false);
        };

        let result = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        self.publish(Collection::Orders, ChangeAction::Delete, &order);
        Ok(true)
    }

    async fn find_header(&self, order_id: &str) -> RepoResult<Option<Order>> {
        self.fetch_header(order_id).await
    }

    async fn update_status(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> RepoResult<Order> {
        let result = sqlx::query(
            "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        )
        .bind(to.as_str())
        .bind(now_millis())
        .bind(order_id)
        .bind(from.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.fetch_header(order_id).await? {
                None => Err(RepoError::NotFound(format!("Order {order_id} not found"))),
                Some(current) => Err(RepoError::Conflict(format!(
                    "Order {order_id} is no longer {from} (now {})",
                    current.status
                ))),
            };
        }

        let updated = self
            .fetch_header(order_id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Order {order_id} not found")))?;
        self.publish(Collection::Orders, ChangeAction::Update, &updated);
        Ok(updated)
    }

    async fn find_detail(&self, order_id: &str) -> RepoResult<Option<OrderDetail>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else { return Ok(None) };
        Ok(self.assemble_details(vec![row]).await?.into_iter().next())
    }

    async fn list_for_owner(&self, user_id: &str) -> RepoResult<Vec<OrderDetail>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        self.assemble_details(rows).await
    }

    async fn list_all(&self) -> RepoResult<Vec<OrderDetail>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        self.assemble_details(rows).await
    }

    async fn find_orphans(&self, cutoff_millis: i64) -> RepoResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT o.id FROM orders o \
             LEFT JOIN order_items oi ON oi.order_id = o.id \
             WHERE oi.id IS NULL AND o.created_at < ?",
        )
        .bind(cutoff_millis)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::DbService;
    use rust_decimal::Decimal;

    pub(crate) async fn memory_store() -> SqliteOrderStore {
        let db = DbService::open_in_memory().await.unwrap();
        SqliteOrderStore::new(db.pool, ChangeFeed::default())
    }

    pub(crate) fn header(user_id: Option<&str>, total: Decimal) -> NewOrder {
        NewOrder::create(
            user_id.map(|u| u.to_string()),
            user_id.map(|u| format!("{u} name")),
            total,
            None,
        )
    }

    fn lines() -> Vec<NewOrderLine> {
        vec![
            NewOrderLine {
                product_id: "prod-a".into(),
                quantity: 2,
                unit_price: Decimal::new(1000, 2),
            },
            NewOrderLine {
                product_id: "prod-b".into(),
                quantity: 1,
                unit_price: Decimal::new(500, 2),
            },
        ]
    }

    #[tokio::test]
    async fn header_and_lines_round_trip() {
        let store = memory_store().await;
        let order = store
            .insert_header(header(Some("u1"), Decimal::new(2500, 2)))
            .await
            .unwrap();
        store.insert_lines(&order, lines()).await.unwrap();

        let detail = store.find_detail(&order.id).await.unwrap().unwrap();
        assert_eq!(detail.order.total, Decimal::new(2500, 2));
        assert_eq!(detail.order.status, OrderStatus::New);
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.items[0].quantity, 2);
        assert_eq!(detail.items[0].unit_price, Decimal::new(1000, 2));
    }

    #[tokio::test]
    async fn delete_header_cascades_over_lines() {
        let store = memory_store().await;
        let order = store
            .insert_header(header(Some("u1"), Decimal::new(2500, 2)))
            .await
            .unwrap();
        store.insert_lines(&order, lines()).await.unwrap();

        assert!(store.delete_header(&order.id).await.unwrap());
        assert!(store.find_detail(&order.id).await.unwrap().is_none());
        // Second delete is a no-op
        assert!(!store.delete_header(&order.id).await.unwrap());
    }

    #[tokio::test]
    async fn status_update_is_guarded_by_expected_prior_status() {
        let store = memory_store().await;
        let order = store
            .insert_header(header(Some("u1"), Decimal::new(100, 2)))
            .await
            .unwrap();

        let updated = store
            .update_status(&order.id, OrderStatus::New, OrderStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Accepted);
        assert!(updated.updated_at >= updated.created_at);

        // A stale writer expecting `new` loses and changes nothing
        let err = store
            .update_status(&order.id, OrderStatus::New, OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Conflict(_)));
        let current = store.find_header(&order.id).await.unwrap().unwrap();
        assert_eq!(current.status, OrderStatus::Accepted);

        let err = store
            .update_status("missing", OrderStatus::New, OrderStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }

    #[tokio::test]
    async fn listings_are_scoped_and_newest_first() {
        let store = memory_store().await;
        let mut first = header(Some("u1"), Decimal::new(100, 2));
        first.created_at -= 1000;
        let first = store.insert_header(first).await.unwrap();
        let second = store
            .insert_header(header(Some("u1"), Decimal::new(200, 2)))
            .await
            .unwrap();
        let foreign = store
            .insert_header(header(Some("u2"), Decimal::new(300, 2)))
            .await
            .unwrap();

        let mine = store.list_for_owner("u1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].order.id, second.id);
        assert_eq!(mine[1].order.id, first.id);

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|d| d.order.id == foreign.id));
    }

    #[tokio::test]
    async fn mutations_publish_change_events() {
        let store = memory_store().await;
        let mut rx = store.subscribe();

        let order = store
            .insert_header(header(Some("u1"), Decimal::new(100, 2)))
            .await
            .unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.collection, Collection::Orders);
        assert_eq!(event.action, ChangeAction::Insert);
        assert_eq!(event.owner.as_deref(), Some("u1"));

        store.insert_lines(&order, lines()).await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.collection, Collection::OrderLines);

        store
            .update_status(&order.id, OrderStatus::New, OrderStatus::Accepted)
            .await
            .unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.action, ChangeAction::Update);
        assert_eq!(event.id, order.id);
    }
}
