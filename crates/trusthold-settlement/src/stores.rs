//! In-memory, thread-safe stores for the settlement plane.
//!
//! Each store holds one entity family behind a single mutex. All
//! cross-entity consistency (reserve stock, then write order, then open
//! escrow) is the orchestrator's saga; the stores only guarantee that an
//! individual read-modify-write is atomic. Escrow mutations go through
//! [`EscrowStore::with_escrow_mut`], which serializes them.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use trusthold_escrow::EscrowTransaction;
use trusthold_types::{
    EscrowId, LineItem, LineItemId, Order, OrderId, Product, ProductId, Result, TrustHoldError,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------

/// Product catalog slice with atomic stock reservation.
#[derive(Default)]
pub struct InventoryStore {
    products: Mutex<HashMap<ProductId, Product>>,
}

impl InventoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        lock(&self.products).insert(product.id, product);
    }

    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<Product> {
        lock(&self.products).get(&id).cloned()
    }

    #[must_use]
    pub fn stock(&self, id: ProductId) -> Option<u32> {
        lock(&self.products).get(&id).map(|p| p.stock)
    }

    /// Conditionally decrement stock. Check and decrement happen under
    /// one lock acquisition, so two concurrent buyers can never both
    /// reserve the last unit.
    ///
    /// Returns a snapshot of the product as it was *after* the decrement.
    ///
    /// # Errors
    /// - `ProductNotFound` for an unknown id
    /// - `ProductInactive` for a deactivated listing
    /// - `InsufficientStock` when fewer than `quantity` units remain
    pub fn try_reserve(&self, id: ProductId, quantity: u32) -> Result<Product> {
        let mut products = lock(&self.products);
        let product = products
            .get_mut(&id)
            .ok_or(TrustHoldError::ProductNotFound(id))?;
        if !product.active {
            return Err(TrustHoldError::ProductInactive(id));
        }
        if !product.has_stock(quantity) {
            return Err(TrustHoldError::InsufficientStock {
                product: id,
                requested: quantity,
                available: product.stock,
            });
        }
        product.stock -= quantity;
        Ok(product.clone())
    }

    /// Saga compensation: put a failed reservation back. A missing
    /// product is logged, not an error — compensation must not fail.
    pub fn restore(&self, id: ProductId, quantity: u32) {
        let mut products = lock(&self.products);
        match products.get_mut(&id) {
            Some(product) => product.stock += quantity,
            None => {
                tracing::warn!(product = %id, quantity, "restore target missing from inventory");
            }
        }
    }
}

// ---------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------

/// Orders and their line items.
#[derive(Default)]
pub struct OrderStore {
    orders: Mutex<HashMap<OrderId, Order>>,
    items: Mutex<HashMap<LineItemId, LineItem>>,
}

impl OrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_order(&self, order: Order) {
        lock(&self.orders).insert(order.id, order);
    }

    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<Order> {
        lock(&self.orders).get(&id).cloned()
    }

    /// Snapshot of every order, for consistency sweeps.
    #[must_use]
    pub fn all_orders(&self) -> Vec<Order> {
        lock(&self.orders).values().cloned().collect()
    }

    /// Run `f` against one order under the store lock.
    ///
    /// # Errors
    /// `OrderNotFound`, or whatever `f` returns.
    pub fn with_order_mut<R>(
        &self,
        id: OrderId,
        f: impl FnOnce(&mut Order) -> Result<R>,
    ) -> Result<R> {
        let mut orders = lock(&self.orders);
        let order = orders.get_mut(&id).ok_or(TrustHoldError::OrderNotFound(id))?;
        f(order)
    }

    pub fn insert_item(&self, item: LineItem) {
        lock(&self.items).insert(item.id, item);
    }

    #[must_use]
    pub fn item(&self, id: LineItemId) -> Option<LineItem> {
        lock(&self.items).get(&id).cloned()
    }

    /// Run `f` against one line item under the store lock. Missing items
    /// are skipped silently; item records trail the order, never gate it.
    pub fn with_item_mut(&self, id: LineItemId, f: impl FnOnce(&mut LineItem)) {
        let mut items = lock(&self.items);
        if let Some(item) = items.get_mut(&id) {
            f(item);
        }
    }
}

// ---------------------------------------------------------------------
// Escrows
// ---------------------------------------------------------------------

/// Escrow transactions. Every mutation goes through
/// [`with_escrow_mut`](Self::with_escrow_mut), so concurrent operations
/// on one escrow are serialized and each sees the other's writes.
#[derive(Default)]
pub struct EscrowStore {
    escrows: Mutex<HashMap<EscrowId, EscrowTransaction>>,
}

impl EscrowStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tx: EscrowTransaction) {
        lock(&self.escrows).insert(tx.id, tx);
    }

    #[must_use]
    pub fn get(&self, id: EscrowId) -> Option<EscrowTransaction> {
        lock(&self.escrows).get(&id).cloned()
    }

    /// The escrow opened for an order, if any.
    #[must_use]
    pub fn by_order(&self, order_id: OrderId) -> Option<EscrowTransaction> {
        lock(&self.escrows)
            .values()
            .find(|tx| tx.order_id == order_id)
            .cloned()
    }

    /// Snapshot of every escrow, for consistency sweeps.
    #[must_use]
    pub fn all(&self) -> Vec<EscrowTransaction> {
        lock(&self.escrows).values().cloned().collect()
    }

    /// Candidate ids for the auto-release sweep: fully HELD with the
    /// hold period elapsed. A stale candidate is re-checked under the
    /// lock before any release.
    #[must_use]
    pub fn held_due(&self, now: DateTime<Utc>) -> Vec<EscrowId> {
        lock(&self.escrows)
            .values()
            .filter(|tx| tx.is_auto_release_due(now))
            .map(|tx| tx.id)
            .collect()
    }

    /// Run `f` against one escrow under the store lock.
    ///
    /// # Errors
    /// `EscrowNotFound`, or whatever `f` returns.
    pub fn with_escrow_mut<R>(
        &self,
        id: EscrowId,
        f: impl FnOnce(&mut EscrowTransaction) -> Result<R>,
    ) -> Result<R> {
        let mut escrows = lock(&self.escrows);
        let tx = escrows
            .get_mut(&id)
            .ok_or(TrustHoldError::EscrowNotFound(id))?;
        f(tx)
    }
}
