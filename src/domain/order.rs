// ============================================================================
// Order Domain Model
// ============================================================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::Pair;

// ============================================================================
// Value Objects
// ============================================================================

/// Unique order identifier, as signed by the client (hex string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderHash(String);

impl OrderHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Random hash, for tests and demos where no client signature exists.
    pub fn generate() -> Self {
        Self(format!("0x{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for OrderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderHash {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("BUY"),
            Side::Sell => f.write_str("SELL"),
        }
    }
}

// ============================================================================
// Order Status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Open,
    PartialFilled,
    Filled,
    Cancelled,
}

impl OrderStatus {
    /// Status is a pure function of the fill state and the cancellation flag.
    pub fn derive(filled_amount: Decimal, amount: Decimal, cancelled: bool) -> Self {
        if cancelled {
            OrderStatus::Cancelled
        } else if filled_amount >= amount && amount > Decimal::ZERO {
            OrderStatus::Filled
        } else if filled_amount > Decimal::ZERO {
            OrderStatus::PartialFilled
        } else {
            OrderStatus::Open
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }

    pub fn can_be_cancelled(&self) -> bool {
        matches!(self, OrderStatus::Open | OrderStatus::PartialFilled)
    }
}

// ============================================================================
// Order Entity
// ============================================================================

/// A client's intent to trade on one pair.
///
/// Owned by the engine while a matching pass runs; once it rests, the
/// order book store holds the authoritative copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub hash: OrderHash,
    pub user_address: String,
    pub pair: Pair,
    pub side: Side,
    pub price: Decimal,
    pub amount: Decimal,
    #[serde(default)]
    pub filled_amount: Decimal,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        user_address: impl Into<String>,
        pair: Pair,
        side: Side,
        price: Decimal,
        amount: Decimal,
    ) -> Self {
        Self {
            hash: OrderHash::generate(),
            user_address: user_address.into(),
            pair,
            side,
            price,
            amount,
            filled_amount: Decimal::ZERO,
            status: OrderStatus::Open,
            created_at: Utc::now(),
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = OrderHash::new(hash);
        self
    }

    pub fn remaining(&self) -> Decimal {
        (self.amount - self.filled_amount).max(Decimal::ZERO)
    }

    pub fn is_filled(&self) -> bool {
        self.remaining().is_zero()
    }

    /// True when the order belongs in the book: not cancelled and something left to fill.
    pub fn is_resting(&self) -> bool {
        self.status != OrderStatus::Cancelled && !self.is_filled()
    }

    /// Fill `quantity` of this order.
    /// Returns false (and leaves the order untouched) if that would over-fill it.
    pub fn try_fill(&mut self, quantity: Decimal) -> bool {
        if quantity <= Decimal::ZERO || quantity > self.remaining() {
            return false;
        }

        self.filled_amount += quantity;
        self.refresh_status();
        true
    }

    pub fn cancel(&mut self) {
        self.status = OrderStatus::Cancelled;
    }

    /// Recompute the status from the fill state, keeping a cancellation.
    pub fn refresh_status(&mut self) {
        self.status = OrderStatus::derive(
            self.filled_amount,
            self.amount,
            self.status == OrderStatus::Cancelled,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(amount: i64) -> Order {
        Order::new(
            "0xabc",
            Pair::new("WETH", "DAI"),
            Side::Buy,
            Decimal::from(100),
            Decimal::from(amount),
        )
    }

    #[test]
    fn test_order_creation() {
        let order = order(1);

        assert_eq!(order.remaining(), Decimal::ONE);
        assert_eq!(order.filled_amount, Decimal::ZERO);
        assert_eq!(order.status, OrderStatus::Open);
        assert!(order.hash.as_str().starts_with("0x"));
    }

    #[test]
    fn test_fill() {
        let mut order = order(10);

        assert!(order.try_fill(Decimal::from(3)));
        assert_eq!(order.filled_amount, Decimal::from(3));
        assert_eq!(order.remaining(), Decimal::from(7));
        assert_eq!(order.status, OrderStatus::PartialFilled);

        assert!(order.try_fill(Decimal::from(7)));
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(!order.is_resting());
    }

    #[test]
    fn test_overfill_protection() {
        let mut order = order(5);

        assert!(!order.try_fill(Decimal::from(10)));
        assert!(!order.try_fill(Decimal::ZERO));
        assert_eq!(order.filled_amount, Decimal::ZERO);
        assert_eq!(order.status, OrderStatus::Open);
    }

    #[test]
    fn test_cancel_survives_refresh() {
        let mut order = order(5);
        order.try_fill(Decimal::ONE);
        order.cancel();
        order.refresh_status();

        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(!order.is_resting());
        assert!(!order.status.can_be_cancelled());
    }

    #[test]
    fn test_status_derivation() {
        let ten = Decimal::from(10);
        assert_eq!(OrderStatus::derive(Decimal::ZERO, ten, false), OrderStatus::Open);
        assert_eq!(OrderStatus::derive(Decimal::ONE, ten, false), OrderStatus::PartialFilled);
        assert_eq!(OrderStatus::derive(ten, ten, false), OrderStatus::Filled);
        assert_eq!(OrderStatus::derive(ten, ten, true), OrderStatus::Cancelled);
        assert!(OrderStatus::Filled.is_terminal());
    }

    #[test]
    fn test_wire_format() {
        let json = r#"{
            "hash": "0x01",
            "userAddress": "0xabc",
            "pair": { "baseToken": "WETH", "quoteToken": "DAI" },
            "side": "SELL",
            "price": "100.5",
            "amount": "8"
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.hash, OrderHash::from("0x01"));
        assert_eq!(order.side, Side::Sell);
        assert_eq!(order.price, Decimal::new(1005, 1));
        assert_eq!(order.filled_amount, Decimal::ZERO);
        assert_eq!(order.status, OrderStatus::Open);

        let encoded = serde_json::to_value(&order).unwrap();
        assert_eq!(encoded["status"], "OPEN");
        assert_eq!(encoded["filledAmount"], "0");
    }
}
