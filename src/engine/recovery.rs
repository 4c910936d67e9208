// ============================================================================
// Recovery Coordinator
// Replays matched-but-unconfirmed fills into the book after a restart
// ============================================================================

use std::sync::Arc;

use crate::domain::{
    EngineConfig, EngineError, FillOrder, OrderCancel, OrderHash, OrderStatus, Response,
};
use crate::engine::guard::MatchingGuard;
use crate::engine::publisher::ResponsePublisher;
use crate::interfaces::OrderBookStore;

/// Outcome of one recovery run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    pub replayed: usize,
    /// Records that could not be replayed, with the reason
    pub skipped: Vec<(OrderHash, String)>,
}

impl RecoveryReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn total(&self) -> usize {
        self.replayed + self.skipped.len()
    }
}

/// Re-applies the resting/removal state of each [`FillOrder`] without
/// re-running matching, then republishes its responses.
///
/// Replay is an upsert by hash, so applying the same record twice leaves
/// a single resting copy. Downstream consumers see the responses again and
/// must be idempotent on trade id.
pub struct RecoveryCoordinator {
    config: Arc<EngineConfig>,
    store: Arc<dyn OrderBookStore>,
    guard: Arc<MatchingGuard>,
    publisher: ResponsePublisher,
}

impl RecoveryCoordinator {
    pub fn new(
        config: Arc<EngineConfig>,
        store: Arc<dyn OrderBookStore>,
        guard: Arc<MatchingGuard>,
        publisher: ResponsePublisher,
    ) -> Self {
        Self {
            config,
            store,
            guard,
            publisher,
        }
    }

    /// Replay every record in order. A failing record is logged and
    /// skipped; it never aborts the rest of the run.
    pub async fn recover(&self, fills: Vec<FillOrder>) -> RecoveryReport {
        let mut report = RecoveryReport::default();

        for fill in fills {
            let hash = fill.order.hash.clone();
            match self.replay(fill).await {
                Ok(()) => report.replayed += 1,
                Err(e) => {
                    tracing::error!(hash = %hash, error = %e, "Skipping recovery record");
                    report.skipped.push((hash, e.to_string()));
                },
            }
        }

        tracing::info!(
            replayed = report.replayed,
            skipped = report.skipped.len(),
            "Recovery finished"
        );
        report
    }

    async fn replay(&self, fill: FillOrder) -> Result<(), EngineError> {
        if self.config.find_pair(&fill.order.pair).is_none() {
            return Err(EngineError::UnknownPair {
                pair: fill.order.pair.code(),
            });
        }

        fill.validate().map_err(|reason| EngineError::InvalidOrder {
            hash: fill.order.hash.clone(),
            reason,
        })?;

        let FillOrder { mut order, trades } = fill;
        order.refresh_status();

        {
            let _lock = self.guard.acquire(&order.pair).await;
            if order.is_resting() {
                self.store.put(&order).await?;
            } else {
                // Already absent is fine
                self.store.delete(&order.pair, &order.hash).await?;
            }
        }

        tracing::debug!(
            hash = %order.hash,
            status = ?order.status,
            trades = trades.len(),
            "Recovery record applied"
        );

        let mut responses: Vec<Response> = trades
            .into_iter()
            .map(|trade| Response::OrderAccepted {
                order: order.clone(),
                trade,
            })
            .collect();

        responses.push(if order.status == OrderStatus::Cancelled {
            Response::OrderCancelled {
                cancel: OrderCancel::for_order(&order),
                order,
            }
        } else {
            Response::outcome(&order)
        });

        self.publisher.publish_all(&responses).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InMemoryMessageBus;
    use crate::domain::{LockGranularity, Order, Pair, Side, Trade};
    use crate::store::{FailingOrderBookStore, InMemoryOrderBookStore};
    use rust_decimal::Decimal;

    struct Fixture {
        store: Arc<InMemoryOrderBookStore>,
        bus: Arc<InMemoryMessageBus>,
        coordinator: RecoveryCoordinator,
    }

    fn fixture() -> Fixture {
        let config = Arc::new(EngineConfig::single_pair("WETH", "DAI"));
        let store = Arc::new(InMemoryOrderBookStore::new());
        let bus = Arc::new(InMemoryMessageBus::new());
        let coordinator = RecoveryCoordinator::new(
            config,
            store.clone(),
            Arc::new(MatchingGuard::new(LockGranularity::PerPair)),
            ResponsePublisher::new(bus.clone(), "responses"),
        );
        Fixture {
            store,
            bus,
            coordinator,
        }
    }

    fn partially_filled() -> FillOrder {
        let pair = Pair::new("WETH", "DAI");
        let maker = Order::new("0x01", pair.clone(), Side::Buy, Decimal::from(100), Decimal::from(8));
        let mut taker = Order::new("0x02", pair, Side::Sell, Decimal::from(100), Decimal::from(8));
        taker.try_fill(Decimal::from(5));
        let trade = Trade::new(&maker, &taker, Decimal::from(5));
        FillOrder::new(taker, vec![trade])
    }

    #[tokio::test]
    async fn test_replay_is_idempotent() {
        let f = fixture();
        let fill = partially_filled();
        let pair = fill.order.pair.clone();

        let first = f.coordinator.recover(vec![fill.clone()]).await;
        let second = f.coordinator.recover(vec![fill.clone()]).await;

        assert!(first.is_clean() && second.is_clean());
        assert_eq!(f.store.order_count(&pair), 1);

        let resting = f.store.get_order(&pair, &fill.order.hash).await.unwrap().unwrap();
        assert_eq!(resting.remaining(), Decimal::from(3));
        assert_eq!(resting.status, OrderStatus::PartialFilled);
    }

    #[tokio::test]
    async fn test_filled_record_is_removed() {
        let f = fixture();
        let mut fill = partially_filled();
        f.coordinator.recover(vec![fill.clone()]).await;

        fill.order.try_fill(Decimal::from(3));
        let report = f.coordinator.recover(vec![fill.clone()]).await;

        assert_eq!(report.replayed, 1);
        assert_eq!(f.store.order_count(&fill.order.pair), 0);
    }

    #[tokio::test]
    async fn test_bad_record_does_not_abort_run() {
        let f = fixture();
        let unknown = FillOrder::new(
            Order::new("0x03", Pair::new("ZRX", "WETH"), Side::Buy, Decimal::ONE, Decimal::ONE),
            Vec::new(),
        );
        let mut overfilled = partially_filled();
        overfilled.order.filled_amount = Decimal::from(9);

        let report = f
            .coordinator
            .recover(vec![unknown.clone(), overfilled, partially_filled()])
            .await;

        assert_eq!(report.replayed, 1);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].0, unknown.order.hash);
        assert_eq!(report.total(), 3);
    }

    #[tokio::test]
    async fn test_store_failure_is_isolated() {
        let store = Arc::new(FailingOrderBookStore::new());
        let coordinator = RecoveryCoordinator::new(
            Arc::new(EngineConfig::single_pair("WETH", "DAI")),
            store.clone(),
            Arc::new(MatchingGuard::new(LockGranularity::PerPair)),
            ResponsePublisher::new(Arc::new(InMemoryMessageBus::new()), "responses"),
        );

        let (first, failing, last) = (partially_filled(), partially_filled(), partially_filled());
        store.poison(&failing.order.hash);

        let report = coordinator
            .recover(vec![first.clone(), failing.clone(), last.clone()])
            .await;

        assert_eq!(report.replayed, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, failing.order.hash);
        assert!(report.skipped[0].1.contains("unavailable"));

        let pair = first.order.pair.clone();
        assert_eq!(store.order_count(&pair), 2);
        assert!(store.get_order(&pair, &last.order.hash).await.unwrap().is_some());
        assert!(store.get_order(&pair, &failing.order.hash).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_publish_failure_is_isolated() {
        let f = fixture();
        f.bus.disconnect();

        let fill = partially_filled();
        let report = f.coordinator.recover(vec![fill.clone()]).await;

        // The book mutation stays applied
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(f.store.order_count(&fill.order.pair), 1);
    }
}
