//! Identifier newtypes and position records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Opaque asset identifier (CLOB token id).
    TokenId
);

string_id!(
    /// Identifier of an in-flight trade.
    TradeId
);

string_id!(
    /// Label grouping in-flight trades (e.g. `"{token}_{side}"`).
    Category
);

/// Position held in one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Number of shares held.
    pub size: Decimal,
    /// Average entry price.
    pub avg_price: Decimal,
}

impl Position {
    pub fn new(size: Decimal, avg_price: Decimal) -> Self {
        Self { size, avg_price }
    }

    /// Position with no shares.
    pub fn is_flat(&self) -> bool {
        self.size.is_zero()
    }

    /// Cost basis (`size * avg_price`).
    pub fn notional(&self) -> Decimal {
        self.size * self.avg_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_id_display_and_json() {
        let token = TokenId::new("7132");
        assert_eq!(token.to_string(), "7132");
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"7132\"");

        let parsed: TradeId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(parsed.as_str(), "abc");
    }

    #[test]
    fn test_position_notional() {
        let pos = Position::new(dec!(120), dec!(0.45));
        assert_eq!(pos.notional(), dec!(54.00));
        assert!(!pos.is_flat());
        assert!(Position::default().is_flat());
    }
}
