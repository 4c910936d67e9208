//! Error taxonomy for the matching core
//!
//! Client-correctable errors (`UnknownPair`, `InvalidOrder`, `OrderNotFound`)
//! are reported back through `Response::Error`; the rest surface to the
//! caller of the top-level operation and are logged.

use thiserror::Error;

use super::response::{ErrorKind, ResponseError};
use super::OrderHash;

/// Failure of the shared order book store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("order book store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupted order book entry {key}: {reason}")]
    Corrupted { key: String, reason: String },
}

/// Failure of the message transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("queue {0} is closed")]
    Closed(String),

    #[error("transport disconnected")]
    Disconnected,

    #[error("message rejected by {queue}: {reason}")]
    Rejected { queue: String, reason: String },
}

/// Why a response could not be published
#[derive(Error, Debug)]
pub enum PublishFailure {
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Transport(#[from] BusError),
}

/// Top-level engine error
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("malformed {what} payload: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown pair: {pair}")]
    UnknownPair { pair: String },

    #[error("invalid order {hash}: {reason}")]
    InvalidOrder { hash: OrderHash, reason: String },

    #[error("order {hash} not found on {pair}")]
    OrderNotFound { pair: String, hash: OrderHash },

    #[error("failed to persist order book state: {0}")]
    StorePersist(#[from] StoreError),

    #[error("failed to publish response to {queue}: {source}")]
    Publish {
        queue: String,
        #[source]
        source: PublishFailure,
    },

    #[error("transport error: {0}")]
    Transport(#[from] BusError),

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("engine is shutting down")]
    ShuttingDown,
}

impl EngineError {
    pub fn decode(what: &'static str, source: serde_json::Error) -> Self {
        EngineError::Decode { what, source }
    }

    /// The Response-level form of a client-correctable error, if this is one
    pub fn response_error(&self) -> Option<ResponseError> {
        let kind = match self {
            EngineError::UnknownPair { .. } => ErrorKind::UnknownPair,
            EngineError::InvalidOrder { .. } => ErrorKind::InvalidOrder,
            EngineError::OrderNotFound { .. } => ErrorKind::OrderNotFound,
            _ => return None,
        };

        Some(ResponseError {
            kind,
            message: self.to_string(),
        })
    }

    pub fn is_client_error(&self) -> bool {
        self.response_error().is_some()
    }
}
