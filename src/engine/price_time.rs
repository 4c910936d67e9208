// ============================================================================
// Price/Time Priority Matching Algorithm (FIFO)
// Best price first, then earliest arrival within a price level
// ============================================================================

use rust_decimal::Decimal;
use smallvec::SmallVec;

use crate::domain::{Order, SelfTradePolicy, Trade};
use crate::interfaces::MatchingAlgorithm;

/// Price/Time Priority (FIFO) matching algorithm
///
/// Orders at the same price level are matched in time priority order.
/// Every trade executes at the resting (maker) price.
///
/// # Example
/// ```text
/// Book:  100 @ 2 (Order A, t=1)
///        100 @ 2 (Order B, t=2)
///
/// Incoming: Buy 3 @ 100
/// Result: Match 2 with A, then 1 with B
/// ```
pub struct PriceTimePriority {
    self_trade_policy: SelfTradePolicy,
}

impl PriceTimePriority {
    pub fn new(self_trade_policy: SelfTradePolicy) -> Self {
        Self { self_trade_policy }
    }

    fn skips(&self, taker: &Order, maker: &Order) -> bool {
        self.self_trade_policy == SelfTradePolicy::Skip
            && maker.user_address.eq_ignore_ascii_case(&taker.user_address)
    }
}

impl Default for PriceTimePriority {
    fn default() -> Self {
        Self::new(SelfTradePolicy::default())
    }
}

impl MatchingAlgorithm for PriceTimePriority {
    fn match_level(&self, taker: &mut Order, makers: &mut [Order]) -> Vec<Trade> {
        let mut trades: SmallVec<[Trade; 4]> = SmallVec::new();

        for maker in makers.iter_mut() {
            if taker.is_filled() {
                break;
            }

            let maker_remaining = maker.remaining();
            if maker_remaining == Decimal::ZERO {
                continue; // Skip already filled orders
            }

            if self.skips(taker, maker) {
                tracing::trace!(maker = %maker.hash, taker = %taker.hash, "Skipping self-trade");
                continue;
            }

            let trade_quantity = taker.remaining().min(maker_remaining);

            if maker.try_fill(trade_quantity) && taker.try_fill(trade_quantity) {
                trades.push(Trade::new(maker, taker, trade_quantity));
            }
        }

        trades.into_vec()
    }

    fn name(&self) -> &str {
        match self.self_trade_policy {
            SelfTradePolicy::Allow => "PriceTime",
            SelfTradePolicy::Skip => "PriceTime-NoSelfTrade",
        }
    }
}
