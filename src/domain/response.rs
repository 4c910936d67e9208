// ============================================================================
// Engine Response
// Output envelope published once per meaningful state transition
// ============================================================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Order, OrderCancel, OrderHash, Trade};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    UnknownPair,
    InvalidOrder,
    OrderNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Result of processing one order intent.
///
/// Wire form: `{"type": "ORDER_FILLED", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    /// A match increment accepted by the engine, awaiting downstream settlement.
    /// `order` is the order whose match produced the trade.
    OrderAccepted { order: Order, trade: Trade },

    /// Rested in the book without any fill
    OrderAdded { order: Order, remaining: Decimal },

    /// Rested in the book after a partial fill
    OrderPartiallyFilled { order: Order, remaining: Decimal },

    OrderFilled { order: Order },

    OrderCancelled { cancel: OrderCancel, order: Order },

    Error {
        #[serde(rename = "orderHash", default, skip_serializing_if = "Option::is_none")]
        order_hash: Option<OrderHash>,
        error: ResponseError,
    },
}

impl Response {
    /// The response describing where `order` ended up after a pass
    pub fn outcome(order: &Order) -> Self {
        if order.is_filled() {
            Response::OrderFilled {
                order: order.clone(),
            }
        } else if order.filled_amount.is_zero() {
            Response::OrderAdded {
                order: order.clone(),
                remaining: order.remaining(),
            }
        } else {
            Response::OrderPartiallyFilled {
                order: order.clone(),
                remaining: order.remaining(),
            }
        }
    }

    pub fn rejected(order_hash: Option<OrderHash>, error: ResponseError) -> Self {
        Response::Error { order_hash, error }
    }

    pub fn order(&self) -> Option<&Order> {
        match self {
            Response::OrderAccepted { order, .. }
            | Response::OrderAdded { order, .. }
            | Response::OrderPartiallyFilled { order, .. }
            | Response::OrderFilled { order }
            | Response::OrderCancelled { order, .. } => Some(order),
            Response::Error { .. } => None,
        }
    }

    pub fn order_hash(&self) -> Option<&OrderHash> {
        match self {
            Response::Error { order_hash, .. } => order_hash.as_ref(),
            other => other.order().map(|o| &o.hash),
        }
    }

    pub fn trade(&self) -> Option<&Trade> {
        match self {
            Response::OrderAccepted { trade, .. } => Some(trade),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ResponseError> {
        match self {
            Response::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Wire tag of this response
    pub fn type_name(&self) -> &'static str {
        match self {
            Response::OrderAccepted { .. } => "ORDER_ACCEPTED",
            Response::OrderAdded { .. } => "ORDER_ADDED",
            Response::OrderPartiallyFilled { .. } => "ORDER_PARTIALLY_FILLED",
            Response::OrderFilled { .. } => "ORDER_FILLED",
            Response::OrderCancelled { .. } => "ORDER_CANCELLED",
            Response::Error { .. } => "ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Pair, Side};

    fn order(amount: i64) -> Order {
        Order::new(
            "0xabc",
            Pair::new("WETH", "DAI"),
            Side::Buy,
            Decimal::from(100),
            Decimal::from(amount),
        )
    }

    #[test]
    fn test_outcome_follows_fill_state() {
        let mut o = order(8);
        assert!(matches!(Response::outcome(&o), Response::OrderAdded { .. }));

        o.try_fill(Decimal::from(5));
        match Response::outcome(&o) {
            Response::OrderPartiallyFilled { remaining, .. } => {
                assert_eq!(remaining, Decimal::from(3))
            },
            other => panic!("unexpected {:?}", other),
        }

        o.try_fill(Decimal::from(3));
        assert!(matches!(Response::outcome(&o), Response::OrderFilled { .. }));
    }

    #[test]
    fn test_wire_tags() {
        let o = order(1);
        let json = serde_json::to_value(Response::outcome(&o)).unwrap();
        assert_eq!(json["type"], "ORDER_ADDED");
        assert_eq!(json["payload"]["remaining"], "1");
        assert_eq!(json["payload"]["order"]["hash"], o.hash.as_str());

        let err = Response::rejected(
            Some(o.hash.clone()),
            ResponseError {
                kind: ErrorKind::UnknownPair,
                message: "unknown pair: X/Y".to_string(),
            },
        );
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "ERROR");
        assert_eq!(json["payload"]["error"]["kind"], "UNKNOWN_PAIR");
        assert_eq!(json["payload"]["orderHash"], o.hash.as_str());
        assert_eq!(err.type_name(), "ERROR");
    }

    #[test]
    fn test_decodes_back() {
        let o = order(2);
        let response = Response::OrderFilled { order: o.clone() };
        let bytes = serde_json::to_vec(&response).unwrap();
        let decoded: Response = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(decoded.order_hash(), Some(&o.hash));
        assert!(decoded.trade().is_none());
    }
}
