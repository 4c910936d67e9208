// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod matching_algorithm;
mod message_bus;
mod order_book_store;
mod response_handler;

pub use matching_algorithm::MatchingAlgorithm;
pub use message_bus::{AckMode, Acker, Delivery, MessageBus, Subscription};
pub use order_book_store::OrderBookStore;
pub use response_handler::{
    handler_fn, ChannelResponseHandler, FnResponseHandler, HandlerError, HandlerResult,
    LoggingResponseHandler, NoOpResponseHandler, ResponseHandler,
};
