// ============================================================================
// Matching Algorithm Interface
// Defines the contract for pluggable matching algorithms
// ============================================================================

use crate::domain::{Order, Side, Trade};
use rust_decimal::Decimal;

/// Strategy pattern interface for matching algorithms.
///
/// The engine walks the opposing side best price first and hands the
/// algorithm one price level at a time, with the resting orders already
/// in time priority. Implementations mutate fill state in place and never
/// touch the store.
pub trait MatchingAlgorithm: Send + Sync {
    /// Match an incoming order against the resting orders of one price level
    ///
    /// # Arguments
    /// * `taker` - The incoming order; its fill state is updated
    /// * `makers` - Resting orders at the level, earliest first; fill state is updated
    ///
    /// # Returns
    /// One trade per match increment, in execution order
    fn match_level(&self, taker: &mut Order, makers: &mut [Order]) -> Vec<Trade>;

    /// Get the algorithm name for logging
    fn name(&self) -> &str;

    /// Check if the taker's limit price crosses a resting price.
    /// Default implementation handles buy/sell logic
    fn prices_cross(&self, taker: &Order, book_price: Decimal) -> bool {
        match taker.side {
            Side::Buy => taker.price >= book_price,
            Side::Sell => taker.price <= book_price,
        }
    }
}
