//! Open order records.

use crate::types::TokenId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exchange-assigned order identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Order status as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Resting on the book.
    Live,
    /// Fully or partially matched.
    Matched,
    /// Cancelled by the user or the exchange.
    Cancelled,
    /// Any status this client does not model.
    #[serde(untagged)]
    Other(String),
}

impl OrderStatus {
    /// Whether the order can still trade.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Live)
    }
}

/// An open order mirrored from the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub token: TokenId,
    pub side: OrderSide,
    pub size: Decimal,
    pub price: Decimal,
    pub status: OrderStatus,
}

impl Order {
    pub fn new(
        token: TokenId,
        side: OrderSide,
        size: Decimal,
        price: Decimal,
        status: OrderStatus,
    ) -> Self {
        Self {
            token,
            side,
            size,
            price,
            status,
        }
    }
}
