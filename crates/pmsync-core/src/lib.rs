//! Core domain types for the pmsync trading-state client.
//!
//! This crate provides the vocabulary shared by every other crate:
//! - `TokenId`, `OrderId`, `TradeId`, `Category`: opaque identifiers
//! - `Position`, `Order`: records mirrored from the exchange
//! - `ApiCredentials`: user-channel authentication fields
//! - Collaborator traits implemented outside this workspace (REST refresh,
//!   market/user message processing)

pub mod collaborator;
pub mod credentials;
pub mod error;
pub mod order;
pub mod types;

pub use collaborator::{
    MarketMessageHandler, RefreshCollaborator, TokenSource, UserMessageHandler,
};
pub use credentials::ApiCredentials;
pub use error::{CoreError, CoreResult};
pub use order::{Order, OrderId, OrderSide, OrderStatus};
pub use types::{Category, Position, TokenId, TradeId};
