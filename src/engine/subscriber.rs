// ============================================================================
// Response Subscriber
// Consumption loop feeding a bounded worker pool of response handlers
// ============================================================================

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::domain::{EngineError, Response};
use crate::interfaces::{AckMode, MessageBus, ResponseHandler, Subscription};

/// Settings for one response subscription
pub struct ResponseSubscriber {
    bus: Arc<dyn MessageBus>,
    queue: String,
    workers: usize,
    capacity: usize,
}

impl ResponseSubscriber {
    pub fn new(bus: Arc<dyn MessageBus>, queue: impl Into<String>, workers: usize, capacity: usize) -> Self {
        Self {
            bus,
            queue: queue.into(),
            workers: workers.max(1),
            capacity: capacity.max(1),
        }
    }

    /// Establish the subscription, then run it in the background.
    ///
    /// Returns once the consumer exists; the handler runs on worker tasks,
    /// so no response is handled before this returns. The returned task ends
    /// on `shutdown` or when the transport closes the subscription, after the
    /// workers have drained the work queue.
    pub async fn spawn(
        self,
        handler: Arc<dyn ResponseHandler>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<JoinHandle<()>, EngineError> {
        let subscription = self.bus.consume(&self.queue, AckMode::Auto).await?;

        let (tx, rx) = mpsc::channel(self.capacity);
        let rx = Arc::new(AsyncMutex::new(rx));

        let workers: Vec<JoinHandle<()>> = (0..self.workers)
            .map(|id| tokio::spawn(run_worker(id, Arc::clone(&rx), Arc::clone(&handler))))
            .collect();

        tracing::info!(
            queue = %self.queue,
            workers = self.workers,
            capacity = self.capacity,
            "Response subscription started"
        );

        Ok(tokio::spawn(async move {
            dispatch(&self.queue, subscription, tx, shutdown).await;

            for worker in workers {
                if let Err(e) = worker.await {
                    tracing::error!(queue = %self.queue, error = %e, "Response worker panicked");
                }
            }
        }))
    }
}

/// Decode deliveries in order and queue them for the workers.
/// A full work queue holds back intake.
async fn dispatch(
    queue: &str,
    mut subscription: Subscription,
    work: mpsc::Sender<Response>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let delivery = tokio::select! {
            _ = shutdown.changed() => break,
            delivery = subscription.next() => delivery,
        };

        let Some(delivery) = delivery else {
            tracing::error!(queue, "Response subscription closed by transport; it must be restarted");
            break;
        };

        match serde_json::from_slice::<Response>(&delivery.body) {
            Ok(response) => {
                if work.send(response).await.is_err() {
                    break;
                }
            },
            Err(e) => {
                tracing::warn!(queue, error = %e, "Skipping undecodable engine response");
            },
        }
    }

    tracing::debug!(queue, "Response dispatch loop stopped");
}

async fn run_worker(
    id: usize,
    work: Arc<AsyncMutex<mpsc::Receiver<Response>>>,
    handler: Arc<dyn ResponseHandler>,
) {
    loop {
        let next = work.lock().await.recv().await;
        let Some(response) = next else {
            break;
        };

        let response_type = response.type_name();
        if let Err(e) = handler.on_response(response).await {
            tracing::warn!(worker = id, response_type, error = %e, "Response handler failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::InMemoryMessageBus;
    use crate::domain::{Order, Pair, Side};
    use crate::interfaces::{handler_fn, ChannelResponseHandler, HandlerError};
    use bytes::Bytes;
    use rust_decimal::Decimal;
    use std::time::Duration;
    use tokio::time::timeout;

    fn response(amount: i64) -> Response {
        let order = Order::new(
            "0xabc",
            Pair::new("WETH", "DAI"),
            Side::Buy,
            Decimal::from(100),
            Decimal::from(amount),
        );
        Response::outcome(&order)
    }

    async fn publish(bus: &InMemoryMessageBus, response: &Response) {
        let body = serde_json::to_vec(response).unwrap();
        bus.publish("responses", Bytes::from(body)).await.unwrap();
    }

    #[tokio::test]
    async fn test_skips_undecodable_messages() {
        let bus = Arc::new(InMemoryMessageBus::new());
        let (_stop, shutdown) = watch::channel(false);
        let (handler, mut rx) = ChannelResponseHandler::channel();

        ResponseSubscriber::new(bus.clone(), "responses", 2, 8)
            .spawn(Arc::new(handler), shutdown)
            .await
            .unwrap();

        bus.publish("responses", Bytes::from_static(b"not json")).await.unwrap();
        publish(&bus, &response(3)).await;

        let received = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert_eq!(received.type_name(), "ORDER_ADDED");
    }

    #[tokio::test]
    async fn test_handler_errors_do_not_stop_the_loop() {
        let bus = Arc::new(InMemoryMessageBus::new());
        let (_stop, shutdown) = watch::channel(false);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handler = handler_fn(move |response: Response| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(response.order().map(|o| o.amount));
                Err::<(), HandlerError>("downstream unavailable".into())
            }
        });

        ResponseSubscriber::new(bus.clone(), "responses", 1, 8)
            .spawn(Arc::new(handler), shutdown)
            .await
            .unwrap();

        publish(&bus, &response(1)).await;
        publish(&bus, &response(2)).await;

        let first = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        let second = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert_eq!(first, Some(Decimal::from(1)));
        assert_eq!(second, Some(Decimal::from(2)));
    }

    #[tokio::test]
    async fn test_shutdown_stops_subscription() {
        let bus = Arc::new(InMemoryMessageBus::new());
        let (stop, shutdown) = watch::channel(false);
        let (handler, _rx) = ChannelResponseHandler::channel();

        let task = ResponseSubscriber::new(bus.clone(), "responses", 2, 8)
            .spawn(Arc::new(handler), shutdown)
            .await
            .unwrap();

        stop.send_replace(true);
        assert!(timeout(Duration::from_secs(1), task).await.is_ok());
    }

    #[tokio::test]
    async fn test_transport_close_ends_loop() {
        let bus = Arc::new(InMemoryMessageBus::new());
        let (_stop, shutdown) = watch::channel(false);

        let task = ResponseSubscriber::new(bus.clone(), "responses", 1, 1)
            .spawn(Arc::new(crate::interfaces::NoOpResponseHandler), shutdown)
            .await
            .unwrap();

        bus.disconnect();
        assert!(timeout(Duration::from_secs(1), task).await.is_ok());
    }
}
