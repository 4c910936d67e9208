// ============================================================================
// Matching Engine Factory
// Creates matching engines with proper configuration
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{EngineConfig, EngineError, LockGranularity, PairConfig, SelfTradePolicy};
use crate::engine::{MatchingEngine, PriceTimePriority};
use crate::interfaces::{MatchingAlgorithm, MessageBus, OrderBookStore};

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates a matching engine from configuration
///
/// # Arguments
/// * `config` - Engine configuration
/// * `store` - Order book backing store
/// * `bus` - Message transport for order intents and responses
///
/// # Returns
/// * `Result<Arc<MatchingEngine>, EngineError>` - Configured matching engine or error
///
/// # Example
/// ```
/// use dex_matching_engine::prelude::*;
/// use std::sync::Arc;
///
/// let config = EngineConfig::single_pair("WETH", "DAI");
/// let engine = create_from_config(
///     config,
///     Arc::new(InMemoryOrderBookStore::new()),
///     Arc::new(InMemoryMessageBus::new()),
/// )
/// .unwrap();
/// assert_eq!(engine.algorithm_name(), "PriceTime");
/// ```
pub fn create_from_config(
    config: EngineConfig,
    store: Arc<dyn OrderBookStore>,
    bus: Arc<dyn MessageBus>,
) -> Result<Arc<MatchingEngine>, EngineError> {
    let algorithm = Box::new(PriceTimePriority::new(config.self_trade_policy));
    create_with_algorithm(config, store, bus, algorithm)
}

fn create_with_algorithm(
    config: EngineConfig,
    store: Arc<dyn OrderBookStore>,
    bus: Arc<dyn MessageBus>,
    algorithm: Box<dyn MatchingAlgorithm>,
) -> Result<Arc<MatchingEngine>, EngineError> {
    // Validate configuration first
    config.validate().map_err(EngineError::InvalidConfig)?;

    Ok(Arc::new(MatchingEngine::new(config, store, bus, algorithm)))
}

// ============================================================================
// Builder Pattern for Advanced Configuration
// ============================================================================

/// Builder for creating matching engines with fluent API
///
/// # Example
/// ```
/// use dex_matching_engine::prelude::*;
/// use rust_decimal::Decimal;
/// use std::sync::Arc;
///
/// let engine = MatchingEngineBuilder::new()
///     .with_pair(PairConfig::new("WETH", "DAI").with_tick_size(Decimal::new(1, 2)))
///     .per_pair_locking()
///     .self_trade_policy(SelfTradePolicy::Skip)
///     .build(
///         Arc::new(InMemoryOrderBookStore::new()),
///         Arc::new(InMemoryMessageBus::new()),
///     )
///     .unwrap();
///
/// assert_eq!(engine.config().pairs.len(), 1);
/// ```
#[derive(Default)]
pub struct MatchingEngineBuilder {
    config: EngineConfig,
    algorithm: Option<Box<dyn MatchingAlgorithm>>,
}

impl MatchingEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            config,
            algorithm: None,
        }
    }

    /// Add a tradable pair
    pub fn with_pair(mut self, pair: PairConfig) -> Self {
        self.config.pairs.push(pair);
        self
    }

    // ========================================================================
    // Matching Guard Configuration
    // ========================================================================

    /// One lock per pair (default)
    pub fn per_pair_locking(mut self) -> Self {
        self.config.lock_granularity = LockGranularity::PerPair;
        self
    }

    /// One lock for every pair
    pub fn global_locking(mut self) -> Self {
        self.config.lock_granularity = LockGranularity::Global;
        self
    }

    // ========================================================================
    // Matching Algorithm Configuration
    // ========================================================================

    pub fn self_trade_policy(mut self, policy: SelfTradePolicy) -> Self {
        self.config.self_trade_policy = policy;
        self
    }

    /// Replace the default price/time algorithm
    pub fn with_algorithm(mut self, algorithm: Box<dyn MatchingAlgorithm>) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    // ========================================================================
    // Queue Configuration
    // ========================================================================

    pub fn order_queue(mut self, queue: impl Into<String>) -> Self {
        self.config.order_queue = queue.into();
        self
    }

    pub fn response_queue(mut self, queue: impl Into<String>) -> Self {
        self.config.response_queue = queue.into();
        self
    }

    /// Worker tasks running response handlers
    pub fn subscriber_workers(mut self, workers: usize) -> Self {
        self.config.subscriber_workers = workers;
        self
    }

    /// Responses buffered ahead of slow handlers
    pub fn subscriber_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.subscriber_queue_capacity = capacity;
        self
    }

    /// NEW_ORDER hashes remembered for duplicate detection; 0 disables
    pub fn dedup_window(mut self, window: usize) -> Self {
        self.config.dedup_window = window;
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the matching engine
    pub fn build(
        self,
        store: Arc<dyn OrderBookStore>,
        bus: Arc<dyn MessageBus>,
    ) -> Result<Arc<MatchingEngine>, EngineError> {
        let algorithm = self
            .algorithm
            .unwrap_or_else(|| Box::new(PriceTimePriority::new(self.config.self_trade_policy)));
        create_with_algorithm(self.config, store, bus, algorithm)
    }

    /// Get the configuration without building (for inspection)
    pub fn get_config(&self) -> &EngineConfig {
        &self.config
    }
}

// ============================================================================
// Engine Slot
// ============================================================================

/// Holds the process's single engine.
///
/// Owned by the composition root; repeated initialization returns the
/// engine built by the first successful call.
#[derive(Default)]
pub struct EngineSlot {
    engine: Mutex<Option<Arc<MatchingEngine>>>,
}

impl EngineSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_init<F>(&self, init: F) -> Result<Arc<MatchingEngine>, EngineError>
    where
        F: FnOnce() -> Result<Arc<MatchingEngine>, EngineError>,
    {
        let mut slot = self.engine.lock();
        if let Some(engine) = slot.as_ref() {
            return Ok(Arc::clone(engine));
        }

        let engine = init()?;
        *slot = Some(Arc::clone(&engine));
        Ok(engine)
    }

    pub fn get(&self) -> Option<Arc<MatchingEngine>> {
        self.engine.lock().clone()
    }
}
