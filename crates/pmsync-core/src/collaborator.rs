//! Interfaces to the collaborators that live outside the sync layer.
//!
//! REST refreshes and message processing are implemented elsewhere; the
//! scheduler and the channel managers only see these traits. Implementations
//! are expected to do their own locking through the shared state store and
//! must never be called while the store's lock is held.

use crate::error::CoreResult;
use crate::types::TokenId;
use serde_json::Value;

/// REST-backed refreshes of markets, positions and orders.
pub trait RefreshCollaborator: Send + Sync {
    /// Reload market metadata and the subscribed token list.
    fn refresh_markets(&self) -> CoreResult<()>;

    /// Reload positions. `lightweight` refreshes average prices only and
    /// keeps the locally tracked sizes.
    fn refresh_positions(&self, lightweight: bool) -> CoreResult<()>;

    /// Reload open orders.
    fn refresh_orders(&self) -> CoreResult<()>;
}

/// Consumer of decoded market-channel messages (order book, price changes).
pub trait MarketMessageHandler: Send + Sync {
    fn process_market_message(&self, payload: &Value) -> CoreResult<()>;
}

/// Consumer of decoded user-channel messages (trades, order updates).
pub trait UserMessageHandler: Send + Sync {
    fn process_user_message(&self, payload: &Value) -> CoreResult<()>;
}

/// Source of the token list subscribed on the market channel.
pub trait TokenSource: Send + Sync {
    fn tokens(&self) -> Vec<TokenId>;
}
