// ============================================================================
// Engine Configuration
// Markets, queue names, locking and callback dispatch settings
// ============================================================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::Pair;

pub const DEFAULT_ORDER_QUEUE: &str = "order-intents";
pub const DEFAULT_RESPONSE_QUEUE: &str = "engine-responses";

// ============================================================================
// Lock Granularity
// ============================================================================

/// Scope of the matching guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockGranularity {
    /// One lock for the whole engine: at most one matching pass at a time
    Global,
    /// One lock per pair: passes on different pairs run concurrently
    #[default]
    PerPair,
}

// ============================================================================
// Self-Trade Policy
// ============================================================================

/// What to do when both sides of a match belong to the same owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfTradePolicy {
    /// Match normally; the validation layer upstream decides
    #[default]
    Allow,
    /// Skip resting orders of the same owner, leaving them in the book
    Skip,
}

// ============================================================================
// Pair Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairConfig {
    pub base_token: String,
    pub quote_token: String,

    /// Optional: Price tick size (minimum price increment)
    /// None means no tick size enforcement
    #[serde(default)]
    pub tick_size: Option<Decimal>,

    /// Optional: Lot size (minimum amount increment)
    /// None means no lot size enforcement
    #[serde(default)]
    pub lot_size: Option<Decimal>,
}

impl PairConfig {
    pub fn new(base_token: impl Into<String>, quote_token: impl Into<String>) -> Self {
        Self {
            base_token: base_token.into(),
            quote_token: quote_token.into(),
            tick_size: None,
            lot_size: None,
        }
    }

    pub fn with_tick_size(mut self, tick: Decimal) -> Self {
        self.tick_size = Some(tick);
        self
    }

    pub fn with_lot_size(mut self, lot: Decimal) -> Self {
        self.lot_size = Some(lot);
        self
    }

    pub fn pair(&self) -> Pair {
        Pair::new(self.base_token.clone(), self.quote_token.clone())
    }

    pub fn code(&self) -> String {
        format!("{}/{}", self.base_token, self.quote_token)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_token.is_empty() || self.quote_token.is_empty() {
            return Err("Pair tokens cannot be empty".to_string());
        }

        if self.base_token == self.quote_token {
            return Err(format!("Pair {} trades a token against itself", self.code()));
        }

        if let Some(tick) = self.tick_size {
            if tick <= Decimal::ZERO {
                return Err(format!("Tick size for {} must be positive", self.code()));
            }
        }

        if let Some(lot) = self.lot_size {
            if lot <= Decimal::ZERO {
                return Err(format!("Lot size for {} must be positive", self.code()));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Complete Engine Configuration
// ============================================================================

fn default_order_queue() -> String {
    DEFAULT_ORDER_QUEUE.to_string()
}

fn default_response_queue() -> String {
    DEFAULT_RESPONSE_QUEUE.to_string()
}

fn default_subscriber_workers() -> usize {
    4
}

fn default_subscriber_queue_capacity() -> usize {
    256
}

fn default_dedup_window() -> usize {
    10_000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Configured markets; orders for any other pair are rejected
    pub pairs: Vec<PairConfig>,

    /// Queue the engine consumes order intents from
    #[serde(default = "default_order_queue")]
    pub order_queue: String,

    /// Durable queue engine responses are published to
    #[serde(default = "default_response_queue")]
    pub response_queue: String,

    #[serde(default)]
    pub lock_granularity: LockGranularity,

    #[serde(default)]
    pub self_trade_policy: SelfTradePolicy,

    /// Concurrent response callback invocations
    #[serde(default = "default_subscriber_workers")]
    pub subscriber_workers: usize,

    /// Decoded responses buffered ahead of the callback workers
    #[serde(default = "default_subscriber_queue_capacity")]
    pub subscriber_queue_capacity: usize,

    /// Recently matched NEW_ORDER hashes remembered to drop redeliveries
    /// of orders that no longer rest; 0 disables the window
    #[serde(default = "default_dedup_window")]
    pub dedup_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pairs: Vec::new(),
            order_queue: default_order_queue(),
            response_queue: default_response_queue(),
            lock_granularity: LockGranularity::default(),
            self_trade_policy: SelfTradePolicy::default(),
            subscriber_workers: default_subscriber_workers(),
            subscriber_queue_capacity: default_subscriber_queue_capacity(),
            dedup_window: default_dedup_window(),
        }
    }
}

impl EngineConfig {
    /// Configuration for a single market with default settings
    pub fn single_pair(base_token: impl Into<String>, quote_token: impl Into<String>) -> Self {
        Self::default().with_pair(PairConfig::new(base_token, quote_token))
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Cannot parse engine config: {}", e))
    }

    /// Builder method: Add a market
    pub fn with_pair(mut self, pair: PairConfig) -> Self {
        self.pairs.push(pair);
        self
    }

    pub fn with_lock_granularity(mut self, granularity: LockGranularity) -> Self {
        self.lock_granularity = granularity;
        self
    }

    pub fn with_self_trade_policy(mut self, policy: SelfTradePolicy) -> Self {
        self.self_trade_policy = policy;
        self
    }

    pub fn find_pair(&self, pair: &Pair) -> Option<&PairConfig> {
        self.pairs
            .iter()
            .find(|p| p.base_token == pair.base_token && p.quote_token == pair.quote_token)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.pairs.is_empty() {
            return Err("At least one pair must be configured".to_string());
        }

        let mut seen = HashSet::new();
        for pair in &self.pairs {
            pair.validate()?;
            if !seen.insert(pair.code()) {
                return Err(format!("Pair {} is configured twice", pair.code()));
            }
        }

        if self.order_queue.is_empty() || self.response_queue.is_empty() {
            return Err("Queue names cannot be empty".to_string());
        }

        if self.order_queue == self.response_queue {
            return Err("Order and response queues must differ".to_string());
        }

        if self.subscriber_workers == 0 {
            return Err("At least one subscriber worker is required".to_string());
        }

        if self.subscriber_queue_capacity == 0 {
            return Err("Subscriber queue capacity must be positive".to_string());
        }

        Ok(())
    }
}
