// ============================================================================
// In-Memory Order Book Store
// Skip-list price levels per pair with FIFO time priority inside a level
// ============================================================================

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use crossbeam_skiplist::SkipMap;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;

use crate::domain::{
    Order, OrderBookSnapshot, OrderHash, Pair, PriceLevelVolume, Side, StoreError,
};
use crate::interfaces::OrderBookStore;

// ============================================================================
// Price Level
// ============================================================================

/// Orders resting at one price, keyed by arrival sequence
#[derive(Debug)]
struct PriceLevel {
    price: Decimal,
    orders: Mutex<BTreeMap<u64, Order>>,
}

impl PriceLevel {
    fn new(price: Decimal) -> Self {
        Self {
            price,
            orders: Mutex::new(BTreeMap::new()),
        }
    }

    fn volume(&self) -> PriceLevelVolume {
        let orders = self.orders.lock();
        PriceLevelVolume::aggregate(self.price, orders.values())
    }

    fn is_empty(&self) -> bool {
        self.orders.lock().is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Location {
    side: Side,
    price: Decimal,
    sequence: u64,
}

// ============================================================================
// Pair Book
// ============================================================================

/// Both sides of one pair.
///
/// Writers serialize on `index`; readers only touch the skip lists and the
/// per-level locks.
struct PairBook {
    bids: SkipMap<Decimal, Arc<PriceLevel>>,
    asks: SkipMap<Decimal, Arc<PriceLevel>>,
    index: Mutex<HashMap<OrderHash, Location>>,
    sequence: AtomicU64,
}

impl PairBook {
    fn new() -> Self {
        Self {
            bids: SkipMap::new(),
            asks: SkipMap::new(),
            index: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }

    fn side(&self, side: Side) -> &SkipMap<Decimal, Arc<PriceLevel>> {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn level(&self, side: Side, price: Decimal) -> Option<Arc<PriceLevel>> {
        self.side(side).get(&price).map(|entry| Arc::clone(entry.value()))
    }

    fn insert_at(&self, location: Location, order: Order) {
        let level = self
            .side(location.side)
            .get_or_insert(location.price, Arc::new(PriceLevel::new(location.price)));
        level.value().orders.lock().insert(location.sequence, order);
    }

    fn remove_at(&self, location: Location) -> Option<Order> {
        let levels = self.side(location.side);
        let level = levels.get(&location.price)?;
        let removed = level.value().orders.lock().remove(&location.sequence);

        // Drop empty price levels
        if level.value().is_empty() {
            levels.remove(&location.price);
        }

        removed
    }

    fn put(&self, order: &Order) {
        let mut index = self.index.lock();

        let sequence = match index.get(&order.hash).copied() {
            Some(existing) if existing.side == order.side && existing.price == order.price => {
                self.insert_at(existing, order.clone());
                return;
            },
            Some(existing) => {
                self.remove_at(existing);
                existing.sequence
            },
            None => self.sequence.fetch_add(1, Ordering::Relaxed),
        };

        let location = Location {
            side: order.side,
            price: order.price,
            sequence,
        };
        self.insert_at(location, order.clone());
        index.insert(order.hash.clone(), location);
    }

    fn delete(&self, hash: &OrderHash) -> Option<Order> {
        let mut index = self.index.lock();
        let location = index.remove(hash)?;
        self.remove_at(location)
    }

    fn get_order(&self, hash: &OrderHash) -> Option<Order> {
        let location = self.index.lock().get(hash).copied()?;
        let level = self.level(location.side, location.price)?;
        let orders = level.orders.lock();
        orders.get(&location.sequence).cloned()
    }

    /// Non-empty levels, best price first
    fn prices(&self, side: Side) -> Vec<Decimal> {
        let levels = self.side(side);
        let iter: Box<dyn Iterator<Item = _>> = match side {
            Side::Buy => Box::new(levels.iter().rev()),
            Side::Sell => Box::new(levels.iter()),
        };

        iter.filter(|entry| !entry.value().is_empty())
            .map(|entry| *entry.key())
            .collect()
    }

    fn depth(&self, side: Side) -> Vec<PriceLevelVolume> {
        let levels = self.side(side);
        let iter: Box<dyn Iterator<Item = _>> = match side {
            Side::Buy => Box::new(levels.iter().rev()),
            Side::Sell => Box::new(levels.iter()),
        };

        iter.map(|entry| entry.value().volume())
            .filter(|volume| volume.amount > Decimal::ZERO)
            .collect()
    }

    fn len(&self) -> usize {
        self.index.lock().len()
    }
}

// ============================================================================
// Store
// ============================================================================

/// Process-local [`OrderBookStore`].
///
/// Pair books are created lazily on first write; reads of an unseen pair
/// behave as reads of an empty book.
#[derive(Default)]
pub struct InMemoryOrderBookStore {
    books: RwLock<HashMap<String, Arc<PairBook>>>,
}

impl InMemoryOrderBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn book(&self, pair: &Pair) -> Option<Arc<PairBook>> {
        self.books.read().get(&pair.code()).cloned()
    }

    fn book_or_create(&self, pair: &Pair) -> Arc<PairBook> {
        if let Some(book) = self.book(pair) {
            return book;
        }

        let mut books = self.books.write();
        Arc::clone(
            books
                .entry(pair.code())
                .or_insert_with(|| Arc::new(PairBook::new())),
        )
    }

    /// Number of resting orders for a pair
    pub fn order_count(&self, pair: &Pair) -> usize {
        self.book(pair).map_or(0, |book| book.len())
    }
}

#[async_trait]
impl OrderBookStore for InMemoryOrderBookStore {
    async fn get(&self, pair: &Pair, side: Side, price: Decimal) -> Result<Vec<Order>, StoreError> {
        let level = match self.book(pair).and_then(|book| book.level(side, price)) {
            Some(level) => level,
            None => return Ok(Vec::new()),
        };

        let orders = level.orders.lock();
        Ok(orders.values().cloned().collect())
    }

    async fn get_order(&self, pair: &Pair, hash: &OrderHash) -> Result<Option<Order>, StoreError> {
        Ok(self.book(pair).and_then(|book| book.get_order(hash)))
    }

    async fn put(&self, order: &Order) -> Result<(), StoreError> {
        self.book_or_create(&order.pair).put(order);
        Ok(())
    }

    async fn delete(&self, pair: &Pair, hash: &OrderHash) -> Result<Option<Order>, StoreError> {
        Ok(self.book(pair).and_then(|book| book.delete(hash)))
    }

    async fn price_levels(&self, pair: &Pair, side: Side) -> Result<Vec<Decimal>, StoreError> {
        Ok(self.book(pair).map(|book| book.prices(side)).unwrap_or_default())
    }

    async fn snapshot(&self, pair: &Pair) -> Result<OrderBookSnapshot, StoreError> {
        let snapshot = match self.book(pair) {
            Some(book) => OrderBookSnapshot::with_depth(
                pair.code(),
                book.depth(Side::Sell),
                book.depth(Side::Buy),
            ),
            None => OrderBookSnapshot::new(pair.code()),
        };

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> Pair {
        Pair::new("WETH", "DAI")
    }

    fn order(side: Side, price: i64, amount: i64) -> Order {
        Order::new("0xabc", pair(), side, Decimal::from(price), Decimal::from(amount))
    }

    #[tokio::test]
    async fn test_level_keeps_arrival_order() {
        let store = InMemoryOrderBookStore::new();
        let first = order(Side::Sell, 100, 1);
        let second = order(Side::Sell, 100, 2);

        store.put(&first).await.unwrap();
        store.put(&second).await.unwrap();

        let level = store.get(&pair(), Side::Sell, Decimal::from(100)).await.unwrap();
        assert_eq!(level.len(), 2);
        assert_eq!(level[0].hash, first.hash);
        assert_eq!(level[1].hash, second.hash);
    }

    #[tokio::test]
    async fn test_update_keeps_time_priority() {
        let store = InMemoryOrderBookStore::new();
        let mut first = order(Side::Buy, 100, 5);
        let second = order(Side::Buy, 100, 5);

        store.put(&first).await.unwrap();
        store.put(&second).await.unwrap();

        first.try_fill(Decimal::from(2));
        store.put(&first).await.unwrap();

        let level = store.get(&pair(), Side::Buy, Decimal::from(100)).await.unwrap();
        assert_eq!(level[0].hash, first.hash);
        assert_eq!(level[0].filled_amount, Decimal::from(2));
        assert_eq!(store.order_count(&pair()), 2);
    }

    #[tokio::test]
    async fn test_price_levels_best_first() {
        let store = InMemoryOrderBookStore::new();
        for price in [101, 99, 100] {
            store.put(&order(Side::Buy, price, 1)).await.unwrap();
            store.put(&order(Side::Sell, price + 10, 1)).await.unwrap();
        }

        let bids = store.price_levels(&pair(), Side::Buy).await.unwrap();
        let asks = store.price_levels(&pair(), Side::Sell).await.unwrap();

        assert_eq!(bids, vec![Decimal::from(101), Decimal::from(100), Decimal::from(99)]);
        assert_eq!(asks, vec![Decimal::from(109), Decimal::from(110), Decimal::from(111)]);
    }

    #[tokio::test]
    async fn test_delete_removes_empty_level() {
        let store = InMemoryOrderBookStore::new();
        let resting = order(Side::Sell, 100, 1);
        store.put(&resting).await.unwrap();

        let removed = store.delete(&pair(), &resting.hash).await.unwrap();
        assert_eq!(removed.map(|o| o.hash), Some(resting.hash.clone()));
        assert!(store.delete(&pair(), &resting.hash).await.unwrap().is_none());
        assert!(store.price_levels(&pair(), Side::Sell).await.unwrap().is_empty());
        assert!(store.get_order(&pair(), &resting.hash).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshot_aggregates_remaining() {
        let store = InMemoryOrderBookStore::new();
        let mut partially = order(Side::Buy, 100, 5);
        partially.try_fill(Decimal::from(2));

        store.put(&partially).await.unwrap();
        store.put(&order(Side::Buy, 100, 4)).await.unwrap();
        store.put(&order(Side::Sell, 105, 1)).await.unwrap();

        let snapshot = store.snapshot(&pair()).await.unwrap();
        assert_eq!(snapshot.pair, "WETH/DAI");
        assert_eq!(snapshot.bids.len(), 1);
        assert_eq!(snapshot.bids[0].amount, Decimal::from(7));
        assert_eq!(snapshot.best_ask(), Some(Decimal::from(105)));
        assert_eq!(snapshot.spread(), Some(Decimal::from(5)));
    }

    #[tokio::test]
    async fn test_unknown_pair_reads_empty() {
        let store = InMemoryOrderBookStore::new();
        let other = Pair::new("ZRX", "WETH");

        assert!(store.snapshot(&other).await.unwrap().is_empty());
        assert!(store.get(&other, Side::Buy, Decimal::ONE).await.unwrap().is_empty());
    }
}
