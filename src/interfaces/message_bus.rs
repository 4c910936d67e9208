// ============================================================================
// Message Bus Interface
// Durable named queues with at-least-once delivery
// ============================================================================

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::domain::BusError;

/// Acknowledgment mode of a consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    /// Deliveries count as acknowledged as soon as they are handed out
    Auto,
    /// The consumer must `ack` each delivery; unsettled deliveries are redelivered
    Manual,
}

/// Settles a manually acknowledged delivery with the transport
pub trait Acker: Send {
    fn ack(self: Box<Self>);

    fn nack(self: Box<Self>, requeue: bool);
}

/// One message handed to a consumer.
///
/// In manual mode a delivery dropped without `ack`/`nack` goes back to its
/// queue, which is what makes consumption at-least-once.
pub struct Delivery {
    pub body: Bytes,
    pub redelivered: bool,
    acker: Option<Box<dyn Acker>>,
}

impl Delivery {
    pub fn new(body: Bytes, redelivered: bool, acker: Option<Box<dyn Acker>>) -> Self {
        Self {
            body,
            redelivered,
            acker,
        }
    }

    pub fn ack(mut self) {
        if let Some(acker) = self.acker.take() {
            acker.ack();
        }
    }

    pub fn nack(mut self, requeue: bool) {
        if let Some(acker) = self.acker.take() {
            acker.nack(requeue);
        }
    }
}

impl Drop for Delivery {
    fn drop(&mut self) {
        if let Some(acker) = self.acker.take() {
            acker.nack(true);
        }
    }
}

impl std::fmt::Debug for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delivery")
            .field("len", &self.body.len())
            .field("redelivered", &self.redelivered)
            .field("manual_ack", &self.acker.is_some())
            .finish()
    }
}

/// Stream of deliveries for one consumer, in queue order.
/// Ends when the transport closes the consumer.
pub struct Subscription {
    deliveries: mpsc::Receiver<Delivery>,
}

impl Subscription {
    pub fn new(deliveries: mpsc::Receiver<Delivery>) -> Self {
        Self { deliveries }
    }

    pub async fn next(&mut self) -> Option<Delivery> {
        self.deliveries.recv().await
    }
}

#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, queue: &str, body: Bytes) -> Result<(), BusError>;

    /// Start a consumer on `queue`. The queue is declared if it does not exist yet.
    async fn consume(&self, queue: &str, ack_mode: AckMode) -> Result<Subscription, BusError>;
}
