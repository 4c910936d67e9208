// ============================================================================
// DEX Matching Engine Library
// Message-driven order matching core with pluggable store and transport
// ============================================================================

//! # DEX Matching Engine
//!
//! The matching core of a decentralized-exchange order pipeline: consumes
//! order intents from a queue, matches them against per-pair order books
//! with price/time priority, and republishes the outcomes.
//!
//! ## Features
//!
//! - **Price/time priority** matching; trades execute at the maker's price
//! - **Per-pair or global matching guard** so no resting order is matched twice
//! - **At-least-once consumption** with duplicate-tolerant dispatch and recovery replay
//! - **Pluggable seams**: [`interfaces::OrderBookStore`], [`interfaces::MessageBus`],
//!   [`interfaces::MatchingAlgorithm`], [`interfaces::ResponseHandler`]
//!
//! ## Example
//!
//! ```rust
//! use dex_matching_engine::prelude::*;
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let engine = MatchingEngineBuilder::new()
//!     .with_pair(PairConfig::new("WETH", "DAI"))
//!     .build(
//!         Arc::new(InMemoryOrderBookStore::new()),
//!         Arc::new(InMemoryMessageBus::new()),
//!     )
//!     .unwrap();
//!
//! let pair = Pair::new("WETH", "DAI");
//! let sell = Order::new("0xseller", pair.clone(), Side::Sell, Decimal::from(100), Decimal::from(8));
//! engine.new_order(sell).await.unwrap();
//!
//! let buy = Order::new("0xbuyer", pair.clone(), Side::Buy, Decimal::from(100), Decimal::from(5));
//! let responses = engine.new_order(buy).await.unwrap();
//! assert_eq!(responses[0].trade().map(|t| t.amount), Some(Decimal::from(5)));
//!
//! let book = engine.get_order_book(&pair).await.unwrap();
//! println!("Best ask: {:?}", book.best_ask());
//! # }
//! ```

pub mod bus;
pub mod domain;
pub mod engine;
pub mod interfaces;
pub mod store;

#[cfg(feature = "logging")]
pub mod telemetry;

// Re-exports for convenience
pub mod prelude {
    pub use crate::bus::InMemoryMessageBus;
    pub use crate::domain::config::{DEFAULT_ORDER_QUEUE, DEFAULT_RESPONSE_QUEUE};
    pub use crate::domain::{
        EngineConfig, EngineError, ErrorKind, FillOrder, LockGranularity, MessageKind, Order,
        OrderBookSnapshot, OrderCancel, OrderHash, OrderMessage, OrderStatus, Pair, PairConfig,
        PriceLevelVolume, Response, ResponseError, SelfTradePolicy, Side, Trade, WebsocketMessage,
    };
    pub use crate::engine::{
        create_from_config, EngineSlot, MatchingEngine, MatchingEngineBuilder, PriceTimePriority,
        RecoveryReport,
    };
    pub use crate::interfaces::{
        handler_fn, AckMode, ChannelResponseHandler, HandlerError, HandlerResult,
        LoggingResponseHandler, MatchingAlgorithm, MessageBus, NoOpResponseHandler, OrderBookStore,
        ResponseHandler,
    };
    pub use crate::store::InMemoryOrderBookStore;
}
