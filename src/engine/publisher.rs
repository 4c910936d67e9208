// ============================================================================
// Response Publisher
// Moves engine responses onto the response queue
// ============================================================================

use std::sync::Arc;

use bytes::Bytes;

use crate::domain::{EngineError, PublishFailure, Response};
use crate::interfaces::MessageBus;

#[derive(Clone)]
pub struct ResponsePublisher {
    bus: Arc<dyn MessageBus>,
    queue: String,
}

impl ResponsePublisher {
    pub fn new(bus: Arc<dyn MessageBus>, queue: impl Into<String>) -> Self {
        Self {
            bus,
            queue: queue.into(),
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Encode `response` as JSON and publish it.
    ///
    /// Failure is final for this response; already applied book mutations
    /// are not rolled back.
    pub async fn publish(&self, response: &Response) -> Result<(), EngineError> {
        let body = serde_json::to_vec(response).map_err(|e| self.failure(e.into()))?;

        self.bus
            .publish(&self.queue, Bytes::from(body))
            .await
            .map_err(|e| self.failure(e.into()))?;

        tracing::trace!(
            queue = %self.queue,
            response_type = response.type_name(),
            "Response published"
        );
        Ok(())
    }

    /// Publish every response in order, even after a failure.
    /// Returns the first error.
    pub async fn publish_all(&self, responses: &[Response]) -> Result<(), EngineError> {
        let mut first_error = None;

        for response in responses {
            if let Err(e) = self.publish(response).await {
                tracing::error!(
                    queue = %self.queue,
                    response_type = response.type_name(),
                    order_hash = ?response.order_hash(),
                    error = %e,
                    "Failed to publish engine response"
                );
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn failure(&self, source: PublishFailure) -> EngineError {
        EngineError::Publish {
            queue: self.queue.clone(),
            source,
        }
    }
}
