// ============================================================================
// Order Book Views
// ============================================================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Order;

/// Aggregated resting volume at one price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevelVolume {
    pub price: Decimal,
    pub amount: Decimal,
}

impl PriceLevelVolume {
    /// Aggregate the remaining amount of the orders resting at `price`
    pub fn aggregate<'a>(price: Decimal, orders: impl IntoIterator<Item = &'a Order>) -> Self {
        Self {
            price,
            amount: orders.into_iter().map(Order::remaining).sum(),
        }
    }
}

// ============================================================================
// Order Book Snapshot
// ============================================================================

/// Point-in-time view of one pair's book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub pair: String,
    /// Ask levels, ascending by price
    pub asks: Vec<PriceLevelVolume>,
    /// Bid levels, descending by price
    pub bids: Vec<PriceLevelVolume>,
}

impl OrderBookSnapshot {
    pub fn new(pair: String) -> Self {
        Self {
            pair,
            asks: Vec::new(),
            bids: Vec::new(),
        }
    }

    pub fn with_depth(pair: String, asks: Vec<PriceLevelVolume>, bids: Vec<PriceLevelVolume>) -> Self {
        Self { pair, asks, bids }
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|level| level.price)
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|level| level.price)
    }

    /// Current spread (ask - bid)
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::from(2)),
            _ => None,
        }
    }

    pub fn total_bid_amount(&self) -> Decimal {
        self.bids.iter().map(|level| level.amount).sum()
    }

    pub fn total_ask_amount(&self) -> Decimal {
        self.asks.iter().map(|level| level.amount).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() && self.bids.is_empty()
    }

    /// Keep only the best `depth` levels on each side
    pub fn truncated(mut self, depth: usize) -> Self {
        self.asks.truncate(depth);
        self.bids.truncate(depth);
        self
    }
}
