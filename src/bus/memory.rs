// ============================================================================
// In-Memory Message Bus
// Named FIFO queues with competing consumers and requeue-on-nack
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};

use crate::domain::BusError;
use crate::interfaces::{AckMode, Acker, Delivery, MessageBus, Subscription};

const DEFAULT_PREFETCH: usize = 64;

#[derive(Debug)]
struct Envelope {
    body: Bytes,
    redelivered: bool,
}

#[derive(Clone)]
struct Queue {
    sender: mpsc::UnboundedSender<Envelope>,
    receiver: Arc<AsyncMutex<mpsc::UnboundedReceiver<Envelope>>>,
}

impl Queue {
    fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Arc::new(AsyncMutex::new(receiver)),
        }
    }
}

/// Puts a settled-with-requeue delivery back on the tail of its queue
struct RequeueAcker {
    queue: mpsc::UnboundedSender<Envelope>,
    body: Bytes,
}

impl Acker for RequeueAcker {
    fn ack(self: Box<Self>) {}

    fn nack(self: Box<Self>, requeue: bool) {
        if requeue {
            // Only fails once the bus itself is gone
            let _ = self.queue.send(Envelope {
                body: self.body,
                redelivered: true,
            });
        }
    }
}

/// Process-local [`MessageBus`].
///
/// Queues are declared on first use and outlive their consumers. Several
/// consumers on one queue compete for messages. `disconnect` simulates a
/// transport failure: consumers end and further calls fail.
pub struct InMemoryMessageBus {
    queues: Mutex<HashMap<String, Queue>>,
    prefetch: usize,
    disconnected: watch::Sender<bool>,
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMessageBus {
    pub fn new() -> Self {
        let (disconnected, _) = watch::channel(false);
        Self {
            queues: Mutex::new(HashMap::new()),
            prefetch: DEFAULT_PREFETCH,
            disconnected,
        }
    }

    /// Maximum deliveries buffered per consumer
    pub fn with_prefetch(mut self, prefetch: usize) -> Self {
        self.prefetch = prefetch.max(1);
        self
    }

    pub fn disconnect(&self) {
        tracing::warn!("Message bus disconnected");
        self.disconnected.send_replace(true);
    }

    pub fn is_connected(&self) -> bool {
        !*self.disconnected.borrow()
    }

    fn queue(&self, name: &str) -> Queue {
        self.queues
            .lock()
            .entry(name.to_string())
            .or_insert_with(Queue::new)
            .clone()
    }

    fn ensure_connected(&self) -> Result<(), BusError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(BusError::Disconnected)
        }
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, queue: &str, body: Bytes) -> Result<(), BusError> {
        self.ensure_connected()?;

        self.queue(queue)
            .sender
            .send(Envelope {
                body,
                redelivered: false,
            })
            .map_err(|_| BusError::Closed(queue.to_string()))
    }

    async fn consume(&self, queue: &str, ack_mode: AckMode) -> Result<Subscription, BusError> {
        self.ensure_connected()?;

        let channel = self.queue(queue);
        let mut disconnected = self.disconnected.subscribe();
        let (tx, rx) = mpsc::channel(self.prefetch);
        let name = queue.to_string();

        tokio::spawn(async move {
            loop {
                let envelope = {
                    let mut source = channel.receiver.lock().await;
                    tokio::select! {
                        _ = tx.closed() => None,
                        _ = disconnected.changed() => None,
                        envelope = source.recv() => envelope,
                    }
                };

                let Some(envelope) = envelope else {
                    break;
                };

                let acker: Option<Box<dyn Acker>> = match ack_mode {
                    AckMode::Auto => None,
                    AckMode::Manual => Some(Box::new(RequeueAcker {
                        queue: channel.sender.clone(),
                        body: envelope.body.clone(),
                    })),
                };

                // A rejected send drops the delivery, which requeues it in manual mode
                if tx
                    .send(Delivery::new(envelope.body, envelope.redelivered, acker))
                    .await
                    .is_err()
                {
                    break;
                }
            }

            tracing::debug!(queue = %name, "Consumer stopped");
        });

        tracing::debug!(queue, ?ack_mode, "Consumer started");
        Ok(Subscription::new(rx))
    }
}
