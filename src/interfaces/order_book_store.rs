// ============================================================================
// Order Book Store Interface
// Shared key-value backing store for resting orders
// ============================================================================

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Order, OrderBookSnapshot, OrderHash, Pair, Side, StoreError};

/// Resting orders per pair, indexed by side, price level and time priority.
///
/// Every call is individually atomic; no multi-key transaction is assumed.
/// Callers serialize mutations of a pair through the matching guard.
#[async_trait]
pub trait OrderBookStore: Send + Sync {
    /// Orders resting at one price level, earliest first
    async fn get(&self, pair: &Pair, side: Side, price: Decimal) -> Result<Vec<Order>, StoreError>;

    async fn get_order(&self, pair: &Pair, hash: &OrderHash) -> Result<Option<Order>, StoreError>;

    /// Insert or update by hash. An update keeps the order's time priority.
    async fn put(&self, order: &Order) -> Result<(), StoreError>;

    /// Remove by hash, returning the removed order if it was present
    async fn delete(&self, pair: &Pair, hash: &OrderHash) -> Result<Option<Order>, StoreError>;

    /// Non-empty price levels of one side, best price first
    /// (descending for bids, ascending for asks)
    async fn price_levels(&self, pair: &Pair, side: Side) -> Result<Vec<Decimal>, StoreError>;

    /// Aggregated volume per level for both sides
    async fn snapshot(&self, pair: &Pair) -> Result<OrderBookSnapshot, StoreError>;
}
