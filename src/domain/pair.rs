// ============================================================================
// Trading Pair
// ============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// Base/quote token pair. Only used as the order book partition key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pair {
    pub base_token: String,
    pub quote_token: String,
}

impl Pair {
    pub fn new(base_token: impl Into<String>, quote_token: impl Into<String>) -> Self {
        Self {
            base_token: base_token.into(),
            quote_token: quote_token.into(),
        }
    }

    /// Partition key, e.g. `WETH/DAI`
    pub fn code(&self) -> String {
        format!("{}/{}", self.base_token, self.quote_token)
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base_token, self.quote_token)
    }
}
