// ============================================================================
// Recovery Records
// ============================================================================

use serde::{Deserialize, Serialize};

use super::{Order, OrderHash, Pair, Trade};

/// An order plus the trades computed for it whose downstream confirmation
/// is uncertain. Built at restart, discarded once replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillOrder {
    pub order: Order,
    #[serde(default)]
    pub trades: Vec<Trade>,
}

impl FillOrder {
    pub fn new(order: Order, trades: Vec<Trade>) -> Self {
        Self { order, trades }
    }

    /// Check the record is internally consistent before trusting it
    pub fn validate(&self) -> Result<(), String> {
        if self.order.hash.is_empty() {
            return Err("order hash is empty".to_string());
        }

        if self.order.filled_amount < rust_decimal::Decimal::ZERO
            || self.order.filled_amount > self.order.amount
        {
            return Err(format!(
                "filled amount {} outside [0, {}]",
                self.order.filled_amount, self.order.amount
            ));
        }

        if let Some(trade) = self
            .trades
            .iter()
            .find(|t| !t.involves(&self.order.hash) || t.pair != self.order.pair)
        {
            return Err(format!("trade {} does not belong to this order", trade.id));
        }

        Ok(())
    }
}

/// A request to remove a resting order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCancel {
    pub order_hash: OrderHash,
    pub pair: Pair,
}

impl OrderCancel {
    pub fn for_order(order: &Order) -> Self {
        Self {
            order_hash: order.hash.clone(),
            pair: order.pair.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Side;
    use rust_decimal::Decimal;

    fn pair() -> Pair {
        Pair::new("WETH", "DAI")
    }

    #[test]
    fn test_valid_fill_order() {
        let maker = Order::new("m", pair(), Side::Sell, Decimal::from(100), Decimal::from(8));
        let mut taker = Order::new("t", pair(), Side::Buy, Decimal::from(100), Decimal::from(10));
        let trade = Trade::new(&maker, &taker, Decimal::from(8));
        taker.try_fill(Decimal::from(8));

        assert!(FillOrder::new(taker, vec![trade]).validate().is_ok());
    }

    #[test]
    fn test_foreign_trade_rejected() {
        let maker = Order::new("m", pair(), Side::Sell, Decimal::from(100), Decimal::from(8));
        let taker = Order::new("t", pair(), Side::Buy, Decimal::from(100), Decimal::from(10));
        let other = Order::new("o", pair(), Side::Buy, Decimal::from(100), Decimal::from(10));
        let trade = Trade::new(&maker, &taker, Decimal::from(8));

        let result = FillOrder::new(other, vec![trade]).validate();
        assert!(result.unwrap_err().contains("does not belong"));
    }

    #[test]
    fn test_overfilled_record_rejected() {
        let mut order = Order::new("t", pair(), Side::Buy, Decimal::from(100), Decimal::from(1));
        order.filled_amount = Decimal::from(2);

        assert!(FillOrder::new(order, Vec::new()).validate().is_err());
    }

    #[test]
    fn test_cancel_for_order() {
        let order = Order::new("t", pair(), Side::Buy, Decimal::from(100), Decimal::from(1));
        let cancel = OrderCancel::for_order(&order);

        assert_eq!(cancel.order_hash, order.hash);
        assert_eq!(cancel.pair, order.pair);
    }
}
