// ============================================================================
// Websocket Notifications
// Envelope downstream broadcasters push to subscribed clients
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::Response;

pub const TRADE_CHANNEL: &str = "trades";
pub const ORDER_BOOK_CHANNEL: &str = "order_book";
pub const ORDER_CHANNEL: &str = "orders";
pub const OHLCV_CHANNEL: &str = "ohlcv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsocketEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsocketMessage {
    pub channel: String,
    pub event: WebsocketEvent,
}

impl WebsocketMessage {
    pub fn new(channel: &str, event_type: &str, hash: Option<String>, payload: Value) -> Self {
        Self {
            channel: channel.to_string(),
            event: WebsocketEvent {
                event_type: event_type.to_string(),
                hash,
                payload,
            },
        }
    }

    /// Client-facing notification for an engine response, on the orders channel
    pub fn from_response(response: &Response) -> Self {
        let hash = response.order_hash().map(|h| h.to_string());

        let (event_type, payload) = match response {
            Response::OrderAccepted { order, trade } => {
                ("ORDER_PENDING", json!({ "order": order, "trade": trade }))
            },
            Response::OrderAdded { order, .. } | Response::OrderPartiallyFilled { order, .. } => {
                ("ORDER_ADDED", json!(order))
            },
            Response::OrderFilled { order } => ("ORDER_SUCCESS", json!({ "order": order })),
            Response::OrderCancelled { cancel, .. } => ("CANCEL_ORDER", json!(cancel)),
            Response::Error { error, .. } => ("ERROR", json!(error)),
        };

        Self::new(ORDER_CHANNEL, event_type, hash, payload)
    }
}
