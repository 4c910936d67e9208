// ============================================================================
// Domain Models Module
// Contains all core domain entities and value objects
// ============================================================================

pub mod config;
pub mod errors;
pub mod fill;
pub mod message;
pub mod notification;
pub mod order;
pub mod order_book;
pub mod pair;
pub mod response;
pub mod trade;

pub use config::{EngineConfig, LockGranularity, PairConfig, SelfTradePolicy};
pub use errors::{BusError, EngineError, PublishFailure, StoreError};
pub use fill::{FillOrder, OrderCancel};
pub use message::{MessageKind, OrderMessage};
pub use notification::WebsocketMessage;
pub use order::{Order, OrderHash, OrderStatus, Side};
pub use order_book::{OrderBookSnapshot, PriceLevelVolume};
pub use pair::Pair;
pub use response::{ErrorKind, Response, ResponseError};
pub use trade::Trade;
