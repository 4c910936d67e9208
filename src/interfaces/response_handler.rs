// ============================================================================
// Response Handler Interface
// Defines the contract for consuming published engine responses
// ============================================================================

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::Response;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = Result<(), HandlerError>;

/// Response handler trait for processing engine responses.
/// Implementations can forward to websockets, settle trades, record metrics, etc.
///
/// Invoked concurrently from the subscriber's worker pool, so no ordering
/// between two calls is guaranteed.
#[async_trait]
pub trait ResponseHandler: Send + Sync {
    /// Handle one decoded response
    async fn on_response(&self, response: Response) -> HandlerResult;
}

/// No-op response handler for testing
pub struct NoOpResponseHandler;

#[async_trait]
impl ResponseHandler for NoOpResponseHandler {
    async fn on_response(&self, _response: Response) -> HandlerResult {
        Ok(())
    }
}

/// Logging response handler
pub struct LoggingResponseHandler;

#[async_trait]
impl ResponseHandler for LoggingResponseHandler {
    async fn on_response(&self, response: Response) -> HandlerResult {
        tracing::debug!(
            response_type = response.type_name(),
            order_hash = ?response.order_hash(),
            "Engine response: {:?}",
            response
        );
        Ok(())
    }
}

/// Forwards every response into an unbounded channel
pub struct ChannelResponseHandler {
    sender: mpsc::UnboundedSender<Response>,
}

impl ChannelResponseHandler {
    pub fn new(sender: mpsc::UnboundedSender<Response>) -> Self {
        Self { sender }
    }

    /// Handler plus the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Response>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl ResponseHandler for ChannelResponseHandler {
    async fn on_response(&self, response: Response) -> HandlerResult {
        self.sender
            .send(response)
            .map_err(|_| "response receiver dropped".into())
    }
}

/// Handler backed by an async closure, see [`handler_fn`]
pub struct FnResponseHandler<F, Fut> {
    f: F,
    _fut: PhantomData<fn() -> Fut>,
}

/// Wrap an async closure as a [`ResponseHandler`]
pub fn handler_fn<F, Fut>(f: F) -> FnResponseHandler<F, Fut>
where
    F: Fn(Response) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    FnResponseHandler {
        f,
        _fut: PhantomData,
    }
}

#[async_trait]
impl<F, Fut> ResponseHandler for FnResponseHandler<F, Fut>
where
    F: Fn(Response) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn on_response(&self, response: Response) -> HandlerResult {
        (self.f)(response).await
    }
}
