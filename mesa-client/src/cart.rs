//! Cart store
//!
//! In-memory cart for the current client session, mirrored to a durable
//! redb slot so it survives restarts. Mutations are debounced into the
//! slot over a 500 ms trailing window; `flush` forces an immediate write
//! (used after checkout). The slot content is a JSON array of lines, one
//! per product id; anything structurally incompatible is treated as absent
//! rather than an error.
//!
//! The slot is shared by every process of the same client. Each process
//! keeps an independent in-memory cart and debounce-writes the same slot,
//! so the last write wins; there is no merge.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use rust_decimal::Decimal;
use shared::models::{CartLine, CartProduct};
use tokio::sync::mpsc;

use crate::error::CartError;

/// Slot table: a single JSON value under a fixed key
const CART_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("cart");
const CART_KEY: &str = "cart";

/// Trailing debounce window for durable writes
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Default tax rate (8%)
pub const DEFAULT_TAX_RATE: Decimal = Decimal::from_parts(8, 0, 0, false, 2);

#[derive(Debug, Default)]
struct CartInner {
    lines: Vec<CartLine>,
    loaded: bool,
}

/// Durable shopping cart
///
/// Construct with [`CartStore::open`], then call [`CartStore::load`] once
/// before mutating; mutations before the restore are rejected so they can
/// never overwrite the saved cart with an empty default.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<RwLock<CartInner>>,
    db: Arc<Database>,
    dirty_tx: mpsc::UnboundedSender<()>,
    flusher: Arc<Mutex<Option<tokio::task::JoinHandle<()>>>>,
}

impl CartStore {
    /// Open (or create) the durable slot and start the debounced flusher.
    /// Must be called from within a tokio runtime.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CartError> {
        let db = Arc::new(Database::create(path).map_err(storage)?);
        let inner = Arc::new(RwLock::new(CartInner::default()));
        let (dirty_tx, dirty_rx) = mpsc::unbounded_channel();

        let flusher = tokio::spawn(run_flusher(inner.clone(), db.clone(), dirty_rx));

        Ok(Self {
            inner,
            db,
            dirty_tx,
            flusher: Arc::new(Mutex::new(Some(flusher))),
        })
    }

    /// One-time restore from the durable slot; flips the `loaded` flag.
    /// Calling again after a successful load is a no-op.
    pub fn load(&self) -> Result<(), CartError> {
        {
            let inner = self.inner.read();
            if inner.loaded {
                return Ok(());
            }
        }

        let lines = read_slot(&self.db)?;
        let mut inner = self.inner.write();
        inner.lines = lines;
        inner.loaded = true;
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.read().loaded
    }

    // ========== Mutations ==========

    /// Add `quantity` of a product. An existing line for the same product
    /// id gets the quantity summed onto it; otherwise a new line is
    /// appended. Price, name and image come from `product`, snapshotted at
    /// call time. Zero quantity is a no-op.
    pub fn add_item(&self, product: CartProduct, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Ok(());
        }
        {
            let mut inner = self.write_guard()?;
            match inner
                .lines
                .iter_mut()
                .find(|line| line.product_id == product.product_id)
            {
                Some(line) => line.quantity += quantity,
                None => inner.lines.push(CartLine::new(product, quantity)),
            }
        }
        self.mark_dirty();
        Ok(())
    }

    /// Replace a line's quantity in place (no reordering). A quantity of
    /// zero or less removes the line instead.
    pub fn update_quantity(&self, product_id: &str, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }
        {
            let mut inner = self.write_guard()?;
            if let Some(line) = inner
                .lines
                .iter_mut()
                .find(|line| line.product_id == product_id)
            {
                line.quantity = quantity as u32;
            }
        }
        self.mark_dirty();
        Ok(())
    }

    /// Remove a line; no-op if absent
    pub fn remove_item(&self, product_id: &str) -> Result<(), CartError> {
        {
            let mut inner = self.write_guard()?;
            inner.lines.retain(|line| line.product_id != product_id);
        }
        self.mark_dirty();
        Ok(())
    }

    /// Empty the cart (used after a successful checkout)
    pub fn clear(&self) -> Result<(), CartError> {
        {
            let mut inner = self.write_guard()?;
            inner.lines.clear();
        }
        self.mark_dirty();
        Ok(())
    }

    // ========== Derived values (always recomputed) ==========

    /// Snapshot of the current lines, in insertion order
    pub fn lines(&self) -> Vec<CartLine> {
        self.inner.read().lines.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().lines.is_empty()
    }

    /// Sum of quantities
    pub fn item_count(&self) -> u64 {
        self.inner
            .read()
            .lines
            .iter()
            .map(|line| line.quantity as u64)
            .sum()
    }

    /// Sum of price * quantity
    pub fn subtotal(&self) -> Decimal {
        self.inner
            .read()
            .lines
            .iter()
            .map(CartLine::line_total)
            .sum()
    }

    /// subtotal * rate
    pub fn tax_at(&self, rate: Decimal) -> Decimal {
        self.subtotal() * rate
    }

    pub fn tax(&self) -> Decimal {
        self.tax_at(DEFAULT_TAX_RATE)
    }

    /// subtotal + tax
    pub fn total_at(&self, rate: Decimal) -> Decimal {
        self.subtotal() + self.tax_at(rate)
    }

    pub fn total(&self) -> Decimal {
        self.total_at(DEFAULT_TAX_RATE)
    }

    // ========== Durability ==========

    /// Write the slot immediately, bypassing the debounce window
    pub fn flush(&self) -> Result<(), CartError> {
        persist(&self.inner, &self.db)
    }

    /// Flush and stop the debounced flusher. Only the last clone should be
    /// closed; other clones keep the flusher alive.
    pub async fn close(self) -> Result<(), CartError> {
        self.flush()?;
        let CartStore {
            inner: _inner,
            db,
            dirty_tx,
            flusher,
        } = self;
        drop(dirty_tx);
        let handle = flusher.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        drop(db);
        Ok(())
    }

    fn write_guard(&self) -> Result<parking_lot::RwLockWriteGuard<'_, CartInner>, CartError> {
        let inner = self.inner.write();
        if !inner.loaded {
            return Err(CartError::NotLoaded);
        }
        Ok(inner)
    }

    fn mark_dirty(&self) {
        let _ = self.dirty_tx.send(());
    }
}

fn storage<E: std::fmt::Display>(err: E) -> CartError {
    CartError::Storage(err.to_string())
}

/// Read the slot; missing, unreadable or structurally incompatible content
/// is an empty cart.
fn read_slot(db: &Database) -> Result<Vec<CartLine>, CartError> {
    let txn = db.begin_read().map_err(storage)?;
    let Ok(table) = txn.open_table(CART_TABLE) else {
        return Ok(vec![]);
    };
    let Some(value) = table.get(CART_KEY).map_err(storage)? else {
        return Ok(vec![]);
    };
    match serde_json::from_slice(value.value()) {
        Ok(lines) => Ok(lines),
        Err(e) => {
            tracing::warn!(error = %e, "Persisted cart is unreadable, starting empty");
            Ok(vec![])
        }
    }
}

fn persist(inner: &RwLock<CartInner>, db: &Database) -> Result<(), CartError> {
    let snapshot = inner.read().lines.clone();
    let bytes = serde_json::to_vec(&snapshot).map_err(storage)?;

    let txn = db.begin_write().map_err(storage)?;
    {
        let mut table = txn.open_table(CART_TABLE).map_err(storage)?;
        table.insert(CART_KEY, bytes.as_slice()).map_err(storage)?;
    }
    txn.commit().map_err(storage)?;
    Ok(())
}

/// Debounced flush loop: each dirty signal opens (or extends) a 500 ms
/// window; the slot is written when the window closes. Exits when every
/// store handle is gone, flushing once more on the way out.
async fn run_flusher(
    inner: Arc<RwLock<CartInner>>,
    db: Arc<Database>,
    mut dirty_rx: mpsc::UnboundedReceiver<()>,
) {
    while dirty_rx.recv().await.is_some() {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(DEBOUNCE) => break,
                more = dirty_rx.recv() => {
                    if more.is_none() {
                        break;
                    }
                }
            }
        }
        if let Err(e) = persist(&inner, &db) {
            tracing::warn!(error = %e, "Failed to persist cart");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn product(id: &str, price: &str) -> CartProduct {
        CartProduct {
            product_id: id.to_string(),
            name: format!("Product {id}"),
            price: price.parse().unwrap(),
            image_url: None,
        }
    }

    fn temp_cart_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("cart.redb")
    }

    async fn loaded_store(dir: &tempfile::TempDir) -> CartStore {
        let store = CartStore::open(temp_cart_path(dir)).unwrap();
        store.load().unwrap();
        store
    }

    #[tokio::test]
    async fn scenario_a_totals() {
        let dir = tempfile::tempdir().unwrap();
        let store = loaded_store(&dir).await;

        store.add_item(product("a", "10.00"), 2).unwrap();
        store.add_item(product("b", "5.00"), 1).unwrap();

        assert_eq!(store.item_count(), 3);
        assert_eq!(store.subtotal(), "25.00".parse::<Decimal>().unwrap());
        assert_eq!(store.tax(), "2.00".parse::<Decimal>().unwrap());
        assert_eq!(store.total(), "27.00".parse::<Decimal>().unwrap());
        // tax == subtotal * rate exactly
        assert_eq!(store.tax(), store.subtotal() * DEFAULT_TAX_RATE);
    }

    #[tokio::test]
    async fn derived_values_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = loaded_store(&dir).await;
        store.add_item(product("a", "3.33"), 3).unwrap();

        assert_eq!(store.subtotal(), store.subtotal());
        assert_eq!(store.tax(), store.tax());
        assert_eq!(store.total(), store.total());
    }

    #[tokio::test]
    async fn adding_same_product_sums_quantities() {
        let dir = tempfile::tempdir().unwrap();
        let store = loaded_store(&dir).await;

        store.add_item(product("a", "10.00"), 2).unwrap();
        store.add_item(product("a", "10.00"), 3).unwrap();

        let lines = store.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
    }

    #[tokio::test]
    async fn zero_quantity_add_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = loaded_store(&dir).await;
        store.add_item(product("a", "10.00"), 0).unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn update_quantity_replaces_in_place_and_zero_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = loaded_store(&dir).await;
        store.add_item(product("a", "10.00"), 1).unwrap();
        store.add_item(product("b", "5.00"), 1).unwrap();

        store.update_quantity("a", 4).unwrap();
        let lines = store.lines();
        // In place: the updated line keeps its position
        assert_eq!(lines[0].product_id, "a");
        assert_eq!(lines[0].quantity, 4);

        store.update_quantity("a", 0).unwrap();
        assert_eq!(store.lines().len(), 1);

        store.update_quantity("b", -1).unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn remove_absent_is_a_no_op_and_clear_empties() {
        let dir = tempfile::tempdir().unwrap();
        let store = loaded_store(&dir).await;
        store.add_item(product("a", "10.00"), 1).unwrap();

        store.remove_item("missing").unwrap();
        assert_eq!(store.lines().len(), 1);

        store.clear().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.item_count(), 0);
    }

    #[tokio::test]
    async fn mutating_before_load_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = CartStore::open(temp_cart_path(&dir)).unwrap();
        assert!(!store.is_loaded());

        let err = store.add_item(product("a", "10.00"), 1).unwrap_err();
        assert!(matches!(err, CartError::NotLoaded));

        store.load().unwrap();
        assert!(store.is_loaded());
        store.add_item(product("a", "10.00"), 1).unwrap();
    }

    #[tokio::test]
    async fn cart_survives_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_cart_path(&dir);

        let store = CartStore::open(&path).unwrap();
        store.load().unwrap();
        store.add_item(product("a", "10.00"), 2).unwrap();
        store.add_item(product("b", "5.00"), 1).unwrap();
        store.close().await.unwrap();

        let reopened = CartStore::open(&path).unwrap();
        reopened.load().unwrap();
        let lines = reopened.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, "a");
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(reopened.subtotal(), "25.00".parse::<Decimal>().unwrap());
        reopened.close().await.unwrap();
    }

    #[tokio::test]
    async fn debounced_write_lands_without_explicit_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_cart_path(&dir);

        let store = CartStore::open(&path).unwrap();
        store.load().unwrap();
        store.add_item(product("a", "10.00"), 1).unwrap();

        // Past the debounce window the slot holds the line
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(200)).await;
        let lines = read_slot(&store.db).unwrap();
        assert_eq!(lines.len(), 1);
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn incompatible_slot_content_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_cart_path(&dir);

        // Seed the slot with structurally incompatible JSON
        {
            let db = Database::create(&path).unwrap();
            let txn = db.begin_write().unwrap();
            {
                let mut table = txn.open_table(CART_TABLE).unwrap();
                table
                    .insert(CART_KEY, br#"{"not": "a cart"}"#.as_slice())
                    .unwrap();
            }
            txn.commit().unwrap();
        }

        let store = CartStore::open(&path).unwrap();
        store.load().unwrap();
        assert!(store.is_empty());
        store.close().await.unwrap();
    }
}
