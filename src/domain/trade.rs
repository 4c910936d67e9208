// ============================================================================
// Trade Domain Model
// ============================================================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Order, OrderHash, Pair, Side};

/// One match increment between a resting (maker) and an incoming (taker) order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    /// Unique trade identifier; downstream consumers deduplicate on it
    pub id: Uuid,

    pub pair: Pair,

    /// Hash of the passive order (resting in book)
    pub maker_order_hash: OrderHash,

    /// Hash of the aggressive order (incoming)
    pub taker_order_hash: OrderHash,

    pub maker: String,
    pub taker: String,

    /// Side of the taker
    pub taker_side: Side,

    /// Execution price, always the maker's price
    pub price: Decimal,

    pub amount: Decimal,

    pub created_at: DateTime<Utc>,
}

impl Trade {
    pub fn new(maker: &Order, taker: &Order, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            pair: taker.pair.clone(),
            maker_order_hash: maker.hash.clone(),
            taker_order_hash: taker.hash.clone(),
            maker: maker.user_address.clone(),
            taker: taker.user_address.clone(),
            taker_side: taker.side,
            price: maker.price,
            amount,
            created_at: Utc::now(),
        }
    }

    /// Quote-token value of the trade (price * amount)
    pub fn notional_value(&self) -> Decimal {
        self.price * self.amount
    }

    pub fn involves(&self, hash: &OrderHash) -> bool {
        &self.maker_order_hash == hash || &self.taker_order_hash == hash
    }
}
