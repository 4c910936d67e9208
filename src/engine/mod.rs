// ============================================================================
// Engine Module
// Contains the core matching engine business logic
// ============================================================================

mod consumer;
mod dedup;
mod guard;
mod matching_engine;
mod price_time;
mod publisher;
mod recovery;
mod subscriber;

pub mod factory;

pub use factory::{create_from_config, EngineSlot, MatchingEngineBuilder};
pub use guard::{MatchingGuard, PairLock};
pub use matching_engine::MatchingEngine;
pub use price_time::PriceTimePriority;
pub use publisher::ResponsePublisher;
pub use recovery::{RecoveryCoordinator, RecoveryReport};
pub use subscriber::ResponseSubscriber;
