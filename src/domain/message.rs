// ============================================================================
// Order Intent Messages
// Envelope consumed from the order-intent queue
// ============================================================================

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::errors::EngineError;
use super::{FillOrder, Order};

/// Message type tags understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    NewOrder,
    AddOrder,
    CancelOrder,
    Recover,
}

impl MessageKind {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "NEW_ORDER" => Some(MessageKind::NewOrder),
            "ADD_ORDER" => Some(MessageKind::AddOrder),
            "CANCEL_ORDER" => Some(MessageKind::CancelOrder),
            "RECOVER" => Some(MessageKind::Recover),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::NewOrder => "NEW_ORDER",
            MessageKind::AddOrder => "ADD_ORDER",
            MessageKind::CancelOrder => "CANCEL_ORDER",
            MessageKind::Recover => "RECOVER",
        }
    }
}

/// `{"type": "NEW_ORDER", "data": {...order...}}`
///
/// The tag is kept as a raw string so unknown types from newer producers
/// still decode and can be skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub data: serde_json::Value,
}

impl OrderMessage {
    pub fn new_order(order: &Order) -> Result<Self, serde_json::Error> {
        Self::with_payload(MessageKind::NewOrder, order)
    }

    pub fn add_order(order: &Order) -> Result<Self, serde_json::Error> {
        Self::with_payload(MessageKind::AddOrder, order)
    }

    pub fn cancel_order(order: &Order) -> Result<Self, serde_json::Error> {
        Self::with_payload(MessageKind::CancelOrder, order)
    }

    pub fn recover(fills: &[FillOrder]) -> Result<Self, serde_json::Error> {
        Self::with_payload(MessageKind::Recover, &fills)
    }

    fn with_payload<T: Serialize>(kind: MessageKind, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            message_type: kind.as_str().to_string(),
            data: serde_json::to_value(payload)?,
        })
    }

    pub fn kind(&self) -> Option<MessageKind> {
        MessageKind::parse(&self.message_type)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, EngineError> {
        serde_json::from_slice(bytes).map_err(|e| EngineError::decode("order message", e))
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode the `data` field into the payload type for this message
    pub fn decode_data<T: DeserializeOwned>(&self, what: &'static str) -> Result<T, EngineError> {
        T::deserialize(&self.data).map_err(|e| EngineError::decode(what, e))
    }
}
