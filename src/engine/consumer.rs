// ============================================================================
// Order Intent Consumer
// Sequential manual-ack loop over the order-intent queue
// ============================================================================

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::EngineError;
use crate::engine::MatchingEngine;
use crate::interfaces::Subscription;

/// Handle deliveries one at a time, in queue order.
///
/// Every handled delivery is acknowledged, including malformed ones and
/// ones whose store or publish step failed: a retry would not fix a bad
/// payload, and lost publications are reconciled by recovery. A delivery
/// that arrives after shutdown began is requeued.
pub(crate) async fn consume_order_intents(
    engine: Arc<MatchingEngine>,
    mut subscription: Subscription,
    mut shutdown: watch::Receiver<bool>,
) {
    let queue = engine.config().order_queue.clone();

    loop {
        if *shutdown.borrow() {
            break;
        }

        // Only checked between deliveries, so an in-flight message completes
        let delivery = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            delivery = subscription.next() => delivery,
        };

        let Some(delivery) = delivery else {
            tracing::error!(queue = %queue, "Order intent subscription closed by transport");
            break;
        };

        match engine.handle_orders(&delivery.body).await {
            Ok(()) => {},
            Err(EngineError::ShuttingDown) => {
                delivery.nack(true);
                break;
            },
            Err(e @ EngineError::Decode { .. }) => {
                tracing::warn!(
                    queue = %queue,
                    redelivered = delivery.redelivered,
                    error = %e,
                    "Dropping malformed order intent"
                );
            },
            Err(e) => {
                tracing::error!(queue = %queue, error = %e, "Order intent failed");
            },
        }

        delivery.ack();
    }

    tracing::info!(queue = %queue, "Order intent consumer stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bytes::Bytes;
    use rust_decimal::Decimal;
    use tokio::time::timeout;

    use crate::bus::InMemoryMessageBus;
    use crate::domain::config::DEFAULT_ORDER_QUEUE;
    use crate::domain::{Order, OrderMessage, Pair, PairConfig, Side};
    use crate::engine::MatchingEngineBuilder;
    use crate::interfaces::{AckMode, MessageBus};
    use crate::store::FailingOrderBookStore;

    fn pair() -> Pair {
        Pair::new("WETH", "DAI")
    }

    async fn send(bus: &InMemoryMessageBus, order: &Order) {
        let body = OrderMessage::new_order(order).unwrap().to_vec().unwrap();
        bus.publish(DEFAULT_ORDER_QUEUE, Bytes::from(body)).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_failure_is_acked_and_skipped() {
        let store = Arc::new(FailingOrderBookStore::new());
        let bus = Arc::new(InMemoryMessageBus::new());
        let engine = MatchingEngineBuilder::new()
            .with_pair(PairConfig::new("WETH", "DAI"))
            .build(store.clone(), bus.clone())
            .unwrap();
        engine.start().await.unwrap();

        let failing = Order::new("0x01", pair(), Side::Buy, Decimal::from(100), Decimal::ONE);
        let next = Order::new("0x02", pair(), Side::Buy, Decimal::from(99), Decimal::ONE);
        store.poison(&failing.hash);
        send(&bus, &failing).await;
        send(&bus, &next).await;

        // The delivery after the failed one is still handled
        timeout(Duration::from_secs(2), async {
            while store.order_count(&pair()) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        engine.shutdown().await;

        // Nothing went back to the queue: both deliveries were acked
        let mut subscription = bus.consume(DEFAULT_ORDER_QUEUE, AckMode::Auto).await.unwrap();
        assert!(timeout(Duration::from_millis(100), subscription.next()).await.is_err());
        assert_eq!(store.order_count(&pair()), 1);
    }
}
