// ============================================================================
// Failing Order Book Store
// Test double whose writes fail for chosen order hashes
// ============================================================================

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{Order, OrderBookSnapshot, OrderHash, Pair, Side, StoreError};
use crate::interfaces::OrderBookStore;
use crate::store::InMemoryOrderBookStore;

/// Delegates to an in-memory store, but `put` and `delete` return
/// `StoreError::Unavailable` for poisoned hashes. Reads always succeed.
#[derive(Default)]
pub(crate) struct FailingOrderBookStore {
    inner: InMemoryOrderBookStore,
    poisoned: Mutex<HashSet<OrderHash>>,
}

impl FailingOrderBookStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn poison(&self, hash: &OrderHash) {
        self.poisoned.lock().insert(hash.clone());
    }

    pub(crate) fn order_count(&self, pair: &Pair) -> usize {
        self.inner.order_count(pair)
    }

    fn check(&self, hash: &OrderHash) -> Result<(), StoreError> {
        if self.poisoned.lock().contains(hash) {
            return Err(StoreError::Unavailable(format!("write refused for {}", hash)));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderBookStore for FailingOrderBookStore {
    async fn get(&self, pair: &Pair, side: Side, price: Decimal) -> Result<Vec<Order>, StoreError> {
        self.inner.get(pair, side, price).await
    }

    async fn get_order(&self, pair: &Pair, hash: &OrderHash) -> Result<Option<Order>, StoreError> {
        self.inner.get_order(pair, hash).await
    }

    async fn put(&self, order: &Order) -> Result<(), StoreError> {
        self.check(&order.hash)?;
        self.inner.put(order).await
    }

    async fn delete(&self, pair: &Pair, hash: &OrderHash) -> Result<Option<Order>, StoreError> {
        self.check(hash)?;
        self.inner.delete(pair, hash).await
    }

    async fn price_levels(&self, pair: &Pair, side: Side) -> Result<Vec<Decimal>, StoreError> {
        self.inner.price_levels(pair, side).await
    }

    async fn snapshot(&self, pair: &Pair) -> Result<OrderBookSnapshot, StoreError> {
        self.inner.snapshot(pair).await
    }
}
