// ============================================================================
// Matching Engine
// Message-driven coordinator for order matching
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::{
    EngineConfig, EngineError, FillOrder, MessageKind, Order, OrderBookSnapshot, OrderCancel,
    OrderHash, OrderMessage, Pair, Response,
};
use crate::engine::consumer::consume_order_intents;
use crate::engine::dedup::ProcessedOrders;
use crate::engine::guard::MatchingGuard;
use crate::engine::publisher::ResponsePublisher;
use crate::engine::recovery::{RecoveryCoordinator, RecoveryReport};
use crate::engine::subscriber::ResponseSubscriber;
use crate::interfaces::{AckMode, MatchingAlgorithm, MessageBus, OrderBookStore, ResponseHandler};
use rust_decimal::Decimal;

/// Matching engine with pluggable store, transport and matching algorithm.
///
/// Construct once per process (see [`crate::engine::EngineSlot`]) and share
/// the `Arc`. Every book mutation happens under the matching guard for the
/// affected pair; book reads do not take the guard and may be slightly stale
/// relative to an in-flight pass.
pub struct MatchingEngine {
    config: Arc<EngineConfig>,

    /// Shared backing store for resting orders
    store: Arc<dyn OrderBookStore>,

    /// Transport for order intents and responses
    bus: Arc<dyn MessageBus>,

    /// Pluggable matching algorithm
    algorithm: Box<dyn MatchingAlgorithm>,

    guard: Arc<MatchingGuard>,

    publisher: ResponsePublisher,

    recovery: RecoveryCoordinator,

    /// NEW_ORDER hashes already matched, for redeliveries that no longer rest
    processed: Mutex<ProcessedOrders>,

    /// Cleared once shutdown starts
    accepting: AtomicBool,

    shutdown: watch::Sender<bool>,

    /// Background consumption loops, awaited on shutdown
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl MatchingEngine {
    /// Create a new matching engine from a validated configuration.
    /// Outside the crate, engines are built through the factory, which validates.
    pub(crate) fn new(
        config: EngineConfig,
        store: Arc<dyn OrderBookStore>,
        bus: Arc<dyn MessageBus>,
        algorithm: Box<dyn MatchingAlgorithm>,
    ) -> Self {
        let config = Arc::new(config);
        let guard = Arc::new(MatchingGuard::new(config.lock_granularity));
        let publisher = ResponsePublisher::new(Arc::clone(&bus), config.response_queue.clone());
        let recovery = RecoveryCoordinator::new(
            Arc::clone(&config),
            Arc::clone(&store),
            Arc::clone(&guard),
            publisher.clone(),
        );
        let processed = Mutex::new(ProcessedOrders::new(config.dedup_window));
        let (shutdown, _) = watch::channel(false);

        Self {
            config,
            store,
            bus,
            algorithm,
            guard,
            publisher,
            recovery,
            processed,
            accepting: AtomicBool::new(true),
            shutdown,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Name of the configured matching algorithm
    pub fn algorithm_name(&self) -> &str {
        self.algorithm.name()
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    // ========================================================================
    // Message dispatch
    // ========================================================================

    /// Decode one order-intent message and dispatch it by type.
    ///
    /// Malformed payloads fail with `Decode` and must not be retried.
    /// Validation failures are published as `Response::Error` and return
    /// `Ok`. Unknown message types are logged and ignored.
    ///
    /// A redelivered intent is dropped when its order still rests, or, for
    /// `NEW_ORDER`, when its hash is within the last `dedup_window` matched
    /// orders. A redelivery older than the window, or one arriving after a
    /// restart, is matched again.
    pub async fn handle_orders(&self, body: &[u8]) -> Result<(), EngineError> {
        if !self.is_accepting() {
            return Err(EngineError::ShuttingDown);
        }

        let message = OrderMessage::from_slice(body)?;
        self.handle_message(message).await
    }

    /// Dispatch an already decoded order-intent message
    pub async fn handle_message(&self, message: OrderMessage) -> Result<(), EngineError> {
        if !self.is_accepting() {
            return Err(EngineError::ShuttingDown);
        }

        let Some(kind) = message.kind() else {
            tracing::warn!(message_type = %message.message_type, "Ignoring unknown message type");
            return Ok(());
        };

        match kind {
            MessageKind::NewOrder => {
                let order: Order = message.decode_data("order")?;
                self.new_order(order).await?;
            },
            MessageKind::AddOrder => {
                let order: Order = message.decode_data("order")?;
                self.add_order(order).await?;
            },
            MessageKind::CancelOrder => {
                let order: Order = message.decode_data("order")?;
                self.cancel_order(&order).await?;
            },
            MessageKind::Recover => {
                let fills: Vec<FillOrder> = message.decode_data("fill orders")?;
                self.recover_orders(fills).await;
            },
        }

        Ok(())
    }

    // ========================================================================
    // Order lifecycle
    // ========================================================================

    /// Match a fresh order and rest any remainder.
    /// Returns the published responses.
    pub async fn new_order(&self, order: Order) -> Result<Vec<Response>, EngineError> {
        self.submit(order, MessageKind::NewOrder).await
    }

    /// Match an order that re-enters with fills it already has, keeping them
    pub async fn add_order(&self, order: Order) -> Result<Vec<Response>, EngineError> {
        self.submit(order, MessageKind::AddOrder).await
    }

    /// Remove the resting copy of `order`, if any
    pub async fn cancel_order(&self, order: &Order) -> Result<Response, EngineError> {
        self.cancel(OrderCancel::for_order(order)).await
    }

    /// Remove a resting order by pair and hash.
    ///
    /// A missing order (already filled or cancelled) is reported as an
    /// `ORDER_NOT_FOUND` error response, not as a failure.
    pub async fn cancel(&self, cancel: OrderCancel) -> Result<Response, EngineError> {
        if self.config.find_pair(&cancel.pair).is_none() {
            let error = EngineError::UnknownPair {
                pair: cancel.pair.code(),
            };
            return self.reject(Some(cancel.order_hash), error).await;
        }

        let removed = {
            let _lock = self.guard.acquire(&cancel.pair).await;
            self.store.delete(&cancel.pair, &cancel.order_hash).await?
        };

        let Some(mut order) = removed else {
            let error = EngineError::OrderNotFound {
                pair: cancel.pair.code(),
                hash: cancel.order_hash.clone(),
            };
            return self.reject(Some(cancel.order_hash), error).await;
        };

        order.cancel();
        tracing::debug!(pair = %cancel.pair, hash = %order.hash, "Order cancelled");

        let response = Response::OrderCancelled { cancel, order };
        self.publisher.publish(&response).await?;
        Ok(response)
    }

    /// Aggregated depth for `pair`: asks ascending, bids descending.
    /// Read without the matching guard.
    pub async fn get_order_book(&self, pair: &Pair) -> Result<OrderBookSnapshot, EngineError> {
        if self.config.find_pair(pair).is_none() {
            return Err(EngineError::UnknownPair { pair: pair.code() });
        }

        Ok(self.store.snapshot(pair).await?)
    }

    /// Replay fills whose downstream confirmation is uncertain
    pub async fn recover_orders(&self, fills: Vec<FillOrder>) -> RecoveryReport {
        self.recovery.recover(fills).await
    }

    // ========================================================================
    // Background consumption
    // ========================================================================

    /// Invoke `handler` once per published response.
    ///
    /// Returns as soon as the subscription exists; handlers run
    /// concurrently on the subscriber's worker pool.
    pub async fn subscribe_response_queue(
        &self,
        handler: Arc<dyn ResponseHandler>,
    ) -> Result<(), EngineError> {
        if !self.is_accepting() {
            return Err(EngineError::ShuttingDown);
        }

        let subscriber = ResponseSubscriber::new(
            Arc::clone(&self.bus),
            self.config.response_queue.clone(),
            self.config.subscriber_workers,
            self.config.subscriber_queue_capacity,
        );
        let task = subscriber.spawn(handler, self.shutdown.subscribe()).await?;
        self.tasks.lock().push(task);
        Ok(())
    }

    /// Start consuming the order-intent queue with manual acknowledgment
    pub async fn start(self: &Arc<Self>) -> Result<(), EngineError> {
        if !self.is_accepting() {
            return Err(EngineError::ShuttingDown);
        }

        let subscription = self
            .bus
            .consume(&self.config.order_queue, AckMode::Manual)
            .await?;

        let task = tokio::spawn(consume_order_intents(
            Arc::clone(self),
            subscription,
            self.shutdown.subscribe(),
        ));
        self.tasks.lock().push(task);

        tracing::info!(
            queue = %self.config.order_queue,
            algorithm = self.algorithm.name(),
            granularity = ?self.guard.granularity(),
            pairs = self.config.pairs.len(),
            "Matching engine started"
        );
        Ok(())
    }

    /// Graceful drain: stop accepting, stop the consumption loops (each
    /// finishes its in-flight message), then wait for in-flight passes.
    pub async fn shutdown(&self) {
        if !self.accepting.swap(false, Ordering::AcqRel) {
            return;
        }

        tracing::info!("Matching engine shutting down");
        self.shutdown.send_replace(true);

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Engine task panicked");
            }
        }

        self.guard.drain().await;
        tracing::info!("Matching engine stopped");
    }

    // ========================================================================
    // Private methods
    // ========================================================================

    async fn submit(&self, mut order: Order, kind: MessageKind) -> Result<Vec<Response>, EngineError> {
        if let Err(e) = self.validate_order(&order, kind) {
            let hash = (!order.hash.is_empty()).then(|| order.hash.clone());
            let response = self.reject(hash, e).await?;
            return Ok(vec![response]);
        }

        order.refresh_status();

        let responses = {
            let _lock = self.guard.acquire(&order.pair).await;

            let seen = kind == MessageKind::NewOrder && self.processed.lock().contains(&order.hash);
            if seen || self.store.get_order(&order.pair, &order.hash).await?.is_some() {
                tracing::debug!(pair = %order.pair, hash = %order.hash, "Dropping duplicate order intent");
                return Ok(Vec::new());
            }

            let responses = self.match_order(&mut order).await?;
            if kind == MessageKind::NewOrder {
                self.processed.lock().insert(order.hash.clone());
            }
            responses
        };

        self.publisher.publish_all(&responses).await?;
        Ok(responses)
    }

    /// One matching pass. Must run under the pair's guard.
    async fn match_order(&self, taker: &mut Order) -> Result<Vec<Response>, EngineError> {
        let pair = taker.pair.clone();
        let maker_side = taker.side.opposite();
        let mut responses = Vec::new();

        let prices = self.store.price_levels(&pair, maker_side).await?;

        for price in prices {
            if taker.is_filled() || !self.algorithm.prices_cross(taker, price) {
                break;
            }

            let mut makers = self.store.get(&pair, maker_side, price).await?;
            let trades = self.algorithm.match_level(taker, &mut makers);
            if trades.is_empty() {
                continue;
            }

            for maker in makers
                .iter()
                .filter(|m| trades.iter().any(|t| t.maker_order_hash == m.hash))
            {
                if maker.is_filled() {
                    self.store.delete(&pair, &maker.hash).await?;
                    tracing::debug!(pair = %pair, hash = %maker.hash, "Resting order filled");
                } else {
                    self.store.put(maker).await?;
                }
            }

            // Each response carries the taker as of its own trade
            let mut filled = taker.filled_amount - trades.iter().map(|t| t.amount).sum::<Decimal>();
            for trade in trades {
                filled += trade.amount;
                let mut order = taker.clone();
                order.filled_amount = filled;
                order.refresh_status();
                responses.push(Response::OrderAccepted { order, trade });
            }
        }

        if taker.is_resting() {
            self.store.put(taker).await?;
            tracing::debug!(
                pair = %pair,
                hash = %taker.hash,
                remaining = %taker.remaining(),
                "Order rested"
            );
        } else {
            tracing::debug!(pair = %pair, hash = %taker.hash, "Order filled");
        }

        responses.push(Response::outcome(taker));
        Ok(responses)
    }

    /// Publish a client-correctable error as a response; any other error
    /// is returned as is.
    async fn reject(&self, hash: Option<OrderHash>, error: EngineError) -> Result<Response, EngineError> {
        let Some(response_error) = error.response_error() else {
            return Err(error);
        };

        tracing::warn!(order_hash = ?hash, error = %error, "Order rejected");

        let response = Response::rejected(hash, response_error);
        self.publisher.publish(&response).await?;
        Ok(response)
    }

    fn validate_order(&self, order: &Order, kind: MessageKind) -> Result<(), EngineError> {
        let pair_config = self
            .config
            .find_pair(&order.pair)
            .ok_or_else(|| EngineError::UnknownPair {
                pair: order.pair.code(),
            })?;

        let invalid = |reason: String| EngineError::InvalidOrder {
            hash: order.hash.clone(),
            reason,
        };

        if order.hash.is_empty() {
            return Err(invalid("order hash is empty".to_string()));
        }

        if order.amount <= Decimal::ZERO {
            return Err(invalid("amount must be positive".to_string()));
        }

        if order.price <= Decimal::ZERO {
            return Err(invalid("price must be positive".to_string()));
        }

        if order.filled_amount < Decimal::ZERO || order.filled_amount > order.amount {
            return Err(invalid(format!(
                "filled amount {} outside [0, {}]",
                order.filled_amount, order.amount
            )));
        }

        if order.status.is_terminal() {
            return Err(invalid(format!("order is already {:?}", order.status)));
        }

        match kind {
            MessageKind::NewOrder if !order.filled_amount.is_zero() => {
                return Err(invalid("new order already carries fills".to_string()));
            },
            MessageKind::AddOrder if order.is_filled() => {
                return Err(invalid("order has nothing left to fill".to_string()));
            },
            _ => {},
        }

        if let Some(tick) = pair_config.tick_size {
            if !(order.price % tick).is_zero() {
                return Err(invalid(format!("price {} is not a multiple of tick size {}", order.price, tick)));
            }
        }

        if let Some(lot) = pair_config.lot_size {
            if !(order.amount % lot).is_zero() {
                return Err(invalid(format!("amount {} is not a multiple of lot size {}", order.amount, lot)));
            }
        }

        Ok(())
    }
}

impl fmt::Debug for MatchingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchingEngine")
            .field("algorithm", &self.algorithm.name())
            .field("granularity", &self.guard.granularity())
            .field("pairs", &self.config.pairs.len())
            .field("accepting", &self.is_accepting())
            .finish_non_exhaustive()
    }
}
